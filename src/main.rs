use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use prism_editor::config::{load_from_path, run_script, EditScript, ScriptEdit, ScriptResult};
use prism_editor::edit::write_atomic;
use prism_editor::selection::{extract_at, list_editable, DeclaredMetrics, MeasuredMetrics};
use prism_editor::validate::error_locations;
use prism_editor::{pool, ElementEdit, ObjectFit, SizingMode};
use similar::{ChangeTag, TextDiff};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "prism-editor")]
#[command(about = "Structural editing for HTML email templates", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply one edit or an edit script to a template
    Apply {
        /// Template file, or a directory of templates
        template: PathBuf,

        /// Address of the element to edit
        #[arg(short, long, conflicts_with = "script")]
        address: Option<String>,

        #[command(flatten)]
        fields: FieldArgs,

        /// Edit script (TOML or JSON) to run instead of a single edit
        #[arg(short, long)]
        script: Option<PathBuf>,

        /// Write the result here instead of stdout
        #[arg(short, long, conflicts_with = "in_place")]
        output: Option<PathBuf>,

        /// Overwrite the template
        #[arg(short, long)]
        in_place: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,

        /// Keep edits even if they add parse errors
        #[arg(long)]
        no_validate: bool,
    },

    /// Print the editable state of one element as JSON
    Inspect {
        template: PathBuf,

        #[arg(short, long)]
        address: String,

        /// Rendered width in pixels
        #[arg(long)]
        width: Option<f64>,

        /// Rendered height in pixels
        #[arg(long)]
        height: Option<f64>,
    },

    /// List every editable element with its address
    List {
        template: PathBuf,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Report markup parse errors
    Check {
        /// Template files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

#[derive(Args)]
struct FieldArgs {
    /// Full edit as JSON, e.g. '{"tagName":"h2","text":"Hi"}'
    #[arg(long)]
    edit: Option<String>,

    /// New tag name
    #[arg(long = "tag")]
    tag_name: Option<String>,

    #[arg(long)]
    text: Option<String>,

    #[arg(long)]
    href: Option<String>,

    #[arg(long)]
    src: Option<String>,

    #[arg(long)]
    alt: Option<String>,

    /// fill, contain, cover, none or scale-down
    #[arg(long)]
    object_fit: Option<String>,

    /// Crop position, e.g. "30% 70%"
    #[arg(long)]
    object_position: Option<String>,

    #[arg(long)]
    height: Option<String>,

    #[arg(long)]
    width: Option<String>,

    #[arg(long)]
    scale: Option<f64>,

    /// Size an image with the fit or fill recipe; explicit flags win
    #[arg(long, value_name = "fit|fill")]
    sizing: Option<SizingMode>,
}

impl FieldArgs {
    fn into_edit(self) -> Result<ElementEdit> {
        let mut edit = match &self.edit {
            Some(json) => serde_json::from_str::<ElementEdit>(json).context("invalid --edit JSON")?,
            None => ElementEdit::default(),
        };

        let object_fit = self
            .object_fit
            .map(|v| v.parse::<ObjectFit>().map_err(anyhow::Error::msg))
            .transpose()?;

        edit.tag_name = self.tag_name.or(edit.tag_name);
        edit.text = self.text.or(edit.text);
        edit.href = self.href.or(edit.href);
        edit.src = self.src.or(edit.src);
        edit.alt = self.alt.or(edit.alt);
        edit.object_fit = object_fit.or(edit.object_fit);
        edit.object_position = self.object_position.or(edit.object_position);
        edit.height = self.height.or(edit.height);
        edit.width = self.width.or(edit.width);
        edit.scale = self.scale.or(edit.scale);

        Ok(edit)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Apply {
            template,
            address,
            fields,
            script,
            output,
            in_place,
            diff,
            no_validate,
        } => {
            let mut script = match (script, address) {
                (Some(path), _) => load_from_path(&path)?,
                (None, Some(address)) => {
                    let sizing = fields.sizing;
                    let mut edit = fields.into_edit()?;
                    if let Some(mode) = sizing {
                        apply_sizing(&template, &address, mode, &mut edit)?;
                    }
                    single_edit_script(address, edit)?
                }
                (None, None) => bail!("either --address or --script is required"),
            };
            if no_validate {
                script.settings.validate_output = false;
            }
            cmd_apply(&template, &script, output, in_place, diff)
        }

        Commands::Inspect {
            template,
            address,
            width,
            height,
        } => cmd_inspect(&template, &address, MeasuredMetrics { width, height }),

        Commands::List { template, json } => cmd_list(&template, json),

        Commands::Check { paths } => cmd_check(&paths),
    }
}

/// Wrap a command-line edit so it runs and reports like a scripted one.
fn single_edit_script(address: String, edit: ElementEdit) -> Result<EditScript> {
    if edit.is_empty() {
        bail!("no fields to change; pass --edit or one of the field flags");
    }

    let mut script = EditScript::default();
    script.edits.push(ScriptEdit {
        id: address.clone(),
        address,
        set: edit,
    });
    script.validate()?;
    Ok(script)
}

/// Fill in the frame fields a sizing recipe sets, reading the image as it is now.
fn apply_sizing(
    template: &Path,
    address: &str,
    mode: SizingMode,
    edit: &mut ElementEdit,
) -> Result<()> {
    if template.is_dir() {
        bail!("--sizing needs a single template, not a directory");
    }

    let html = read_template(template)?;
    let Some(descriptor) = extract_at(&html, address, &DeclaredMetrics) else {
        bail!("address {address:?} does not name an element in {}", template.display());
    };
    if !descriptor.is_image() {
        bail!("--sizing {mode} applies to images, not <{}>", descriptor.tag_name);
    }

    let frame = mode.frame(&descriptor);
    edit.object_fit = edit.object_fit.or(frame.object_fit);
    edit.height = edit.height.take().or(frame.height);
    edit.width = edit.width.take().or(frame.width);
    Ok(())
}

/// Helper: Collect `*.html` / `*.htm` files under a directory, sorted.
fn discover_templates(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry?;
        let is_html = entry
            .path()
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"));
        if entry.file_type().is_file() && is_html {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort();
    if files.is_empty() {
        bail!("no .html templates found in {}", dir.display());
    }
    Ok(files)
}

fn expand_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            files.extend(discover_templates(path)?);
        } else {
            files.push(path.clone());
        }
    }
    Ok(files)
}

fn read_template(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Helper: Show unified diff between original and modified content
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (edited)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
        if change.missing_newline() {
            println!();
        }
    }
}

fn report(result: &ScriptResult) {
    match result {
        ScriptResult::Applied {
            id,
            recovered,
            ignored,
        } => {
            let note = if *recovered {
                " (found through wrapper link)".dimmed().to_string()
            } else {
                String::new()
            };
            eprintln!("{} {}: Applied{}", "✓".green(), id, note);
            for field in ignored {
                eprintln!("  {} {}", "ignored:".yellow(), field);
            }
        }
        ScriptResult::AlreadyApplied { id } => {
            eprintln!("{} {}: Already applied", "⊙".yellow(), id);
        }
        ScriptResult::Failed { id, reason } => {
            eprintln!("{} {}: Failed - {}", "✗".red(), id, reason);
        }
    }
}

fn cmd_apply(
    template: &Path,
    script: &EditScript,
    output: Option<PathBuf>,
    in_place: bool,
    show_diff: bool,
) -> Result<()> {
    let is_dir = template.is_dir();
    if is_dir && output.is_some() {
        bail!("--output cannot be used with a directory; use --in-place");
    }
    if is_dir && !in_place && !show_diff {
        eprintln!(
            "{}",
            "Note: without --in-place or --diff nothing is written for directories".dimmed()
        );
    }

    let templates = if is_dir {
        discover_templates(template)?
    } else {
        vec![template.to_path_buf()]
    };

    let mut total_applied = 0;
    let mut total_already_applied = 0;
    let mut total_failed = 0;

    for path in &templates {
        let before = read_template(path)?;
        if is_dir {
            eprintln!("{}", path.display().to_string().bold());
        }

        let outcome = run_script(&before, script);
        for result in &outcome.results {
            report(result);
        }
        total_applied += outcome.applied();
        total_already_applied += outcome.already_applied();
        total_failed += outcome.failed();

        if show_diff && outcome.html != before {
            display_diff(path, &before, &outcome.html);
        }

        if in_place {
            if outcome.html != before {
                write_atomic(path, outcome.html.as_bytes())
                    .with_context(|| format!("failed to write {}", path.display()))?;
            }
        } else if let Some(output) = &output {
            write_atomic(output, outcome.html.as_bytes())
                .with_context(|| format!("failed to write {}", output.display()))?;
        } else if !is_dir && !show_diff {
            print!("{}", outcome.html);
        }
    }

    eprintln!();
    eprintln!("{}", "Summary:".bold());
    eprintln!("  {} applied", format!("{}", total_applied).green());
    eprintln!(
        "  {} already applied",
        format!("{}", total_already_applied).yellow()
    );
    eprintln!("  {} failed", format!("{}", total_failed).red());

    if total_failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_inspect(template: &Path, address: &str, metrics: MeasuredMetrics) -> Result<()> {
    let html = read_template(template)?;
    let Some(descriptor) = extract_at(&html, address, &metrics) else {
        bail!("address {address:?} does not name an element in {}", template.display());
    };
    println!("{}", serde_json::to_string_pretty(&descriptor)?);
    Ok(())
}

fn cmd_list(template: &Path, json: bool) -> Result<()> {
    let html = read_template(template)?;
    let elements = list_editable(&html)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&elements)?);
        return Ok(());
    }

    let width = elements
        .iter()
        .map(|el| el.address.to_string().len())
        .max()
        .unwrap_or(0);

    for el in &elements {
        let text: String = el.text.split_whitespace().collect::<Vec<_>>().join(" ");
        let text = if text.chars().count() > 48 {
            format!("{}…", text.chars().take(47).collect::<String>())
        } else {
            text
        };
        println!(
            "{:<width$}  {:<6}  {}",
            el.address.to_string(),
            el.tag_name.cyan(),
            text.dimmed(),
            width = width
        );
    }

    println!();
    println!("{} editable elements", elements.len());
    Ok(())
}

fn cmd_check(paths: &[PathBuf]) -> Result<()> {
    let files = expand_paths(paths)?;
    let mut clean = 0;
    let mut broken = 0;

    for path in &files {
        let html = read_template(path)?;
        let errors = pool::with_parser(|parser| -> Result<_> {
            let parsed = parser.parse_with_source(&html)?;
            Ok(error_locations(&parsed))
        })??;

        if errors.is_empty() {
            println!("{} {}", "✓".green(), path.display());
            clean += 1;
            continue;
        }

        broken += 1;
        eprintln!(
            "{} {}: {} parse error(s)",
            "✗".red(),
            path.display(),
            errors.len()
        );
        for error in &errors {
            eprintln!(
                "  {}:{}:{}: near {}",
                path.display(),
                error.line,
                error.column,
                format!("{:?}", error.context).dimmed()
            );
        }
    }

    println!();
    println!("{}", "Summary:".bold());
    println!("  {} clean", format!("{}", clean).green());
    println!("  {} with errors", format!("{}", broken).red());

    if broken > 0 {
        std::process::exit(1);
    }

    Ok(())
}
