use bookpress::config::{self, ConfigSource};
use bookpress::enrichment::{NoEnrichment, StyleEnricher};
use bookpress::fonts::FontConfig;
use bookpress::layout::page_count;
use bookpress::plan::{self, PlanFeature, PlanTier};
use bookpress::style::{known_categories, NAMED_PALETTES};
use bookpress::{validation, Book, ExportFormat, ExportOptions};
use clap::{Arg, Command};
use log::{error, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

#[derive(Debug)]
enum AppError {
    BookError(String),
    ExportError(String),
    PathError(String),
    PlanError(String),
    UsageError(String),
}

/// Verbosity level for output
#[derive(Debug, Clone, Copy, PartialEq)]
enum Verbosity {
    Quiet,   // No output except errors
    Normal,  // Standard output
    Verbose, // Detailed output
}

impl Verbosity {
    fn from_matches(matches: &clap::ArgMatches) -> Self {
        if matches.get_flag("quiet") {
            Verbosity::Quiet
        } else if matches.get_flag("verbose") {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }

    fn log_level(self) -> log::LevelFilter {
        match self {
            Verbosity::Quiet => log::LevelFilter::Error,
            Verbosity::Normal => log::LevelFilter::Warn,
            Verbosity::Verbose => log::LevelFilter::Info,
        }
    }
}

/// Get the configuration source based on CLI arguments or default behavior.
///
/// Priority order:
/// 1. If `--config` is explicitly provided, use that file
/// 2. If `bookpressrc.toml` exists in the current directory or the user config
///    directory, use it
/// 3. Otherwise use default configuration
fn get_config_source(matches: &clap::ArgMatches) -> ConfigSource<'static> {
    if let Some(config_file) = matches.get_one::<String>("config") {
        return ConfigSource::File(Box::leak(config_file.to_string().into_boxed_str()));
    }

    if let Some(found) = config::discover_config_file() {
        return ConfigSource::File(Box::leak(
            found.display().to_string().into_boxed_str(),
        ));
    }

    ConfigSource::Default
}

/// Output format: `--format`, else the output file extension, else PDF.
fn get_format(matches: &clap::ArgMatches) -> Result<ExportFormat, AppError> {
    if let Some(name) = matches.get_one::<String>("format") {
        return ExportFormat::parse(name).ok_or_else(|| {
            AppError::UsageError(format!(
                "unknown format '{}' (expected pdf, html, epub, md or txt)",
                name
            ))
        });
    }
    Ok(matches
        .get_one::<String>("output")
        .and_then(|p| ExportFormat::from_path(p))
        .unwrap_or(ExportFormat::Pdf))
}

fn get_output_path(matches: &clap::ArgMatches, format: ExportFormat) -> Result<PathBuf, AppError> {
    let current_dir = std::env::current_dir().map_err(|e| AppError::PathError(e.to_string()))?;

    Ok(matches
        .get_one::<String>("output")
        .map(|p| current_dir.join(p))
        .unwrap_or_else(|| current_dir.join(format!("output.{}", format.extension()))))
}

fn get_plan(matches: &clap::ArgMatches) -> Result<Option<PlanTier>, AppError> {
    match matches.get_one::<String>("plan") {
        Some(name) => PlanTier::parse(name).map(Some).ok_or_else(|| {
            AppError::UsageError(format!(
                "unknown plan '{}' (expected free, starter, pro or enterprise)",
                name
            ))
        }),
        None => Ok(None),
    }
}

/// Configuration font settings extended with `--font-path` and `--embed-fonts`.
fn get_font_config(matches: &clap::ArgMatches, base: FontConfig) -> FontConfig {
    let mut font_config = base;
    if let Some(paths) = matches.get_many::<String>("font-path") {
        font_config.custom_paths.extend(paths.map(PathBuf::from));
    }
    if matches.get_flag("embed-fonts") {
        font_config.embed_system_fonts = true;
    }
    font_config
}

/// The enricher to consult, or [`NoEnrichment`] when no endpoint is configured.
fn get_enricher(
    matches: &clap::ArgMatches,
    settings: &bookpress::enrichment::EnrichmentConfig,
) -> Box<dyn StyleEnricher> {
    let mut settings = settings.clone();
    if let Some(url) = matches.get_one::<String>("enrich-url") {
        settings.url = Some(url.to_string());
    }

    #[cfg(feature = "fetch")]
    {
        match bookpress::enrichment::HttpEnricher::from_config(&settings) {
            Some(Ok(enricher)) => return Box::new(enricher),
            Some(Err(e)) => warn!("{}; continuing without style enrichment", e),
            None => {}
        }
    }
    #[cfg(not(feature = "fetch"))]
    if settings.url.is_some() {
        warn!("Style enrichment needs the 'fetch' feature; continuing without it");
    }

    Box::new(NoEnrichment)
}

fn print_schemes() {
    println!("default     category palette, or the enrichment suggestion");
    println!("custom      three colors from [color].custom");
    for (name, [text, background, accent]) in NAMED_PALETTES {
        println!("{:<11} {} on {}, accent {}", name, text, background, accent);
    }
}

fn print_size(path: &Path) {
    if let Ok(metadata) = fs::metadata(path) {
        let size_kb = metadata.len() as f64 / 1024.0;
        if size_kb < 1024.0 {
            println!("   Size: {:.1} KB", size_kb);
        } else {
            println!("   Size: {:.2} MB", size_kb / 1024.0);
        }
    }
}

fn run(matches: clap::ArgMatches) -> Result<(), AppError> {
    let verbosity = Verbosity::from_matches(&matches);
    let dry_run = matches.get_flag("dry-run");

    let book_path = matches
        .get_one::<String>("book")
        .ok_or_else(|| AppError::UsageError("no book file given".to_string()))?;
    let book = Book::load(Path::new(book_path)).map_err(|e| AppError::BookError(e.to_string()))?;

    let settings = config::load_config_from_source(get_config_source(&matches));
    let format = get_format(&matches)?;
    let output_path = get_output_path(&matches, format)?;
    let output_path_str = output_path
        .to_str()
        .ok_or_else(|| AppError::PathError("Invalid output path".to_string()))?;
    let font_config = get_font_config(&matches, settings.fonts.clone());

    let tier = get_plan(&matches)?;
    let options: ExportOptions = match tier {
        Some(tier) => {
            plan::check_export(tier, &book, &settings.options, format)
                .map_err(|e| AppError::PlanError(e.to_string()))?;
            plan::restrict_options(tier, &settings.options)
        }
        None => settings.options.clone(),
    };

    // Run validation checks
    let fonts_cover_text = format != ExportFormat::Pdf || font_config.wants_embedding();
    let warnings = validation::validate_export(&book, &options, fonts_cover_text);
    if verbosity != Verbosity::Quiet {
        if !warnings.is_empty() {
            if verbosity == Verbosity::Verbose {
                info!("🔍 Pre-flight validation:");
            }
            for warning in &warnings {
                warn!("{}", warning);
            }
        } else if verbosity == Verbosity::Verbose {
            info!("✓ Pre-flight validation passed");
        }

        if dry_run {
            let (_, ops) = bookpress::layout_book(&book, &options, None);
            println!(
                "✓ Dry-run validation complete: {} chapter(s), {} page(s). No file generated.",
                book.chapters.len(),
                page_count(&ops)
            );
            if warnings.is_empty() {
                println!("✓ No issues detected. Run without --dry-run to export.");
            } else {
                println!(
                    "⚠️  {} warning(s) found. Review above and run without --dry-run to export anyway.",
                    warnings.len()
                );
            }
            return Ok(());
        }
    } else if dry_run {
        if warnings.is_empty() {
            return Ok(());
        } else {
            return Err(AppError::BookError(format!(
                "{} validation warnings",
                warnings.len()
            )));
        }
    }

    let enricher: Box<dyn StyleEnricher> = match tier {
        Some(tier) if !plan::has_feature(tier, PlanFeature::StyleEnrichment) => {
            if matches.contains_id("enrich-url") || settings.enrichment.url.is_some() {
                warn!(
                    "Style enrichment is not part of the {} plan; using category defaults",
                    tier.as_str()
                );
            }
            Box::new(NoEnrichment)
        }
        _ => get_enricher(&matches, &settings.enrichment),
    };

    if verbosity == Verbosity::Verbose {
        info!("📄 Exporting '{}' as {}...", book.display_title(), format.as_str());
    }

    let document = bookpress::export_with_enricher(
        &book,
        &options,
        format,
        enricher.as_ref(),
        Some(&font_config),
    )
    .map_err(|e| AppError::ExportError(e.to_string()))?;

    if matches.get_flag("data-uri") {
        println!("{}", document.to_data_uri());
        return Ok(());
    }

    bookpress::save_document(&document, output_path_str)
        .map_err(|e| AppError::ExportError(e.to_string()))?;

    if verbosity != Verbosity::Quiet {
        println!(
            "✅ Successfully saved {} to {}",
            format.as_str().to_uppercase(),
            output_path_str
        );
        if verbosity == Verbosity::Verbose {
            print_size(&output_path);
        }
    }

    Ok(())
}

fn build_cli() -> Command {
    Command::new("bookpress")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Lay out a book and export it as PDF, paged HTML, EPUB, Markdown or plain text")
        .after_help(
            "EXAMPLES:\n  \
            bookpress -b novel.json -o novel.pdf\n  \
            bookpress -b novel.toml -o novel.html --plan starter\n  \
            bookpress -b novel.json -f txt --dry-run --verbose\n  \
            bookpress -b novel.json --embed-fonts --font-path ./fonts\n",
        )
        .arg(
            Arg::new("book")
                .short('b')
                .long("book")
                .value_name("BOOK_FILE")
                .help("Book file in JSON or TOML (title, author, category, chapters, credits)"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("OUTPUT_PATH")
                .help("Path to the output file (defaults to ./output.<format>)"),
        )
        .arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .value_name("FORMAT")
                .help("pdf, html, epub, md or txt (defaults to the output extension, then pdf)"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("CONFIG_FILE")
                .help("Path to configuration file (TOML format). Auto-detects bookpressrc.toml if not specified"),
        )
        .arg(
            Arg::new("plan")
                .long("plan")
                .value_name("TIER")
                .help("Check the export against a plan: free, starter, pro or enterprise"),
        )
        .arg(
            Arg::new("enrich-url")
                .long("enrich-url")
                .value_name("URL")
                .help("Style suggestion endpoint (overrides [enrichment].url)"),
        )
        .arg(
            Arg::new("font-path")
                .long("font-path")
                .value_name("PATH")
                .help("Path to custom font directory or font file")
                .action(clap::ArgAction::Append),
        )
        .arg(
            Arg::new("embed-fonts")
                .long("embed-fonts")
                .help("Embed matching system fonts in the PDF instead of the base-14 fonts")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("data-uri")
                .long("data-uri")
                .help("Print the export as a base64 data URI instead of writing a file")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Show detailed output including validation warnings and file size")
                .action(clap::ArgAction::SetTrue)
                .conflicts_with("quiet"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Suppress all output except errors")
                .action(clap::ArgAction::SetTrue)
                .conflicts_with("verbose"),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Validate and lay out the book without writing a file")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("get-default-configuration")
                .long("get-default-configuration")
                .help("Print a default bookpressrc.toml to stdout and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("list-schemes")
                .long("list-schemes")
                .help("List the color schemes and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("list-categories")
                .long("list-categories")
                .help("List the book categories with a dedicated style and exit")
                .action(clap::ArgAction::SetTrue),
        )
}

fn main() {
    let mut cmd = build_cli();
    let matches = cmd.clone().get_matches();

    // RUST_LOG wins over the verbosity flags
    let mut logger = env_logger::Builder::from_default_env();
    if std::env::var_os("RUST_LOG").is_none() {
        logger.filter_level(Verbosity::from_matches(&matches).log_level());
    }
    logger.format_timestamp_millis().init();

    if matches.get_flag("get-default-configuration") {
        println!("{}", config::default_config_toml());
        process::exit(0);
    }

    if matches.get_flag("list-schemes") {
        print_schemes();
        process::exit(0);
    }

    if matches.get_flag("list-categories") {
        for category in known_categories() {
            println!("{}", category);
        }
        process::exit(0);
    }

    if !matches.contains_id("book") {
        let _ = cmd.print_help();
        println!();
        process::exit(1);
    }

    if let Err(e) = run(matches) {
        match e {
            AppError::BookError(e) => error!("[X] Book error: {}", e),
            AppError::ExportError(e) => error!("[X] Export error: {}", e),
            AppError::PathError(e) => error!("[X] Path error: {}", e),
            AppError::PlanError(e) => error!("[X] Plan error: {}", e),
            AppError::UsageError(e) => error!("[X] Usage error: {}", e),
        }
        process::exit(1);
    }
}

#[cfg(test)]
mod cli_tests {
    use super::*;
    use std::env;

    fn write_book(name: &str, json: &str) -> PathBuf {
        let path = env::temp_dir().join(name);
        fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn test_format_from_flag_and_extension() {
        let matches = build_cli().get_matches_from(vec!["bookpress", "-f", "md"]);
        assert_eq!(get_format(&matches).unwrap(), ExportFormat::Markdown);

        let matches = build_cli().get_matches_from(vec!["bookpress", "-o", "book.html"]);
        assert_eq!(get_format(&matches).unwrap(), ExportFormat::Html);

        let matches = build_cli().get_matches_from(vec!["bookpress"]);
        assert_eq!(get_format(&matches).unwrap(), ExportFormat::Pdf);

        let matches = build_cli().get_matches_from(vec!["bookpress", "-f", "docx"]);
        assert!(matches!(get_format(&matches), Err(AppError::UsageError(_))));
    }

    #[test]
    fn test_default_output_follows_format() {
        let matches = build_cli().get_matches_from(vec!["bookpress"]);
        let path = get_output_path(&matches, ExportFormat::Text).unwrap();
        assert!(path.ends_with("output.txt"));

        let matches = build_cli().get_matches_from(vec!["bookpress", "-o", "my.pdf"]);
        let path = get_output_path(&matches, ExportFormat::Pdf).unwrap();
        assert!(path.ends_with("my.pdf"));
    }

    #[test]
    fn test_get_config_source_explicit_config() {
        let matches = build_cli().get_matches_from(vec!["bookpress", "--config", "custom.toml"]);
        match get_config_source(&matches) {
            ConfigSource::File(path) => assert_eq!(path, "custom.toml"),
            _ => panic!("Expected File config source"),
        }
    }

    #[test]
    fn test_font_flags_extend_config() {
        let matches = build_cli().get_matches_from(vec![
            "bookpress",
            "--font-path",
            "./fonts",
            "--embed-fonts",
        ]);
        let fonts = get_font_config(&matches, FontConfig::default());
        assert_eq!(fonts.custom_paths, vec![PathBuf::from("./fonts")]);
        assert!(fonts.embed_system_fonts);
    }

    #[test]
    fn test_plan_parsing() {
        let matches = build_cli().get_matches_from(vec!["bookpress", "--plan", "Pro"]);
        assert_eq!(get_plan(&matches).unwrap(), Some(PlanTier::Pro));

        let matches = build_cli().get_matches_from(vec!["bookpress", "--plan", "gold"]);
        assert!(get_plan(&matches).is_err());
    }

    #[test]
    fn test_run_dry_run_returns_ok() {
        let book = write_book(
            "bookpress_cli_dry_run.json",
            r#"{"title": "Small", "chapters": [{"title": "One", "content": "Hi.", "order": 1}]}"#,
        );
        let matches = build_cli().get_matches_from(vec![
            "bookpress",
            "-b",
            book.to_str().unwrap(),
            "--dry-run",
        ]);
        let res = run(matches);
        let _ = fs::remove_file(&book);
        assert!(res.is_ok());
    }

    #[test]
    fn test_run_rejects_format_outside_plan() {
        let book = write_book(
            "bookpress_cli_plan.json",
            r#"{"title": "Small", "chapters": []}"#,
        );
        let matches = build_cli().get_matches_from(vec![
            "bookpress",
            "-b",
            book.to_str().unwrap(),
            "-f",
            "html",
            "--plan",
            "free",
            "--data-uri",
        ]);
        let res = run(matches);
        let _ = fs::remove_file(&book);
        assert!(matches!(res, Err(AppError::PlanError(_))));
    }
}
