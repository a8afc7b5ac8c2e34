use crate::address::codec::Address;
use crate::html::{ElementRef, ParsedHtml};
use tracing::debug;

/// A resolved target element.
#[derive(Clone, Copy)]
pub struct Resolution<'p> {
    pub element: ElementRef<'p>,
    /// Found only through the anchor-step retry
    pub recovered: bool,
}

/// Resolve an address against a freshly parsed document.
///
/// Tries the address as given, then exactly once more with an `a` step
/// inserted before the last step. Nothing beyond that single retry is
/// attempted.
pub fn resolve<'p>(parsed: &'p ParsedHtml<'_>, address: &Address) -> Option<Resolution<'p>> {
    if let Some(element) = address.locate(parsed) {
        return Some(Resolution {
            element,
            recovered: false,
        });
    }

    let retry = address.with_anchor_step()?;
    debug!(%address, %retry, "direct resolution failed, retrying through wrapper link");

    retry.locate(parsed).map(|element| Resolution {
        element,
        recovered: true,
    })
}
