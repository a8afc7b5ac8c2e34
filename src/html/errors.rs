use thiserror::Error;

#[derive(Error, Debug)]
pub enum HtmlError {
    #[error("failed to set HTML language for parser")]
    LanguageSet,

    #[error("failed to parse HTML document")]
    ParseFailed,
}
