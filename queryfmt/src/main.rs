//! # queryfmt
//!
//! A CLI tool for rendering structured query results in many output formats.
//!
//! ## Overview
//!
//! queryfmt is built on top of queryfmtlib and provides a command-line
//! interface for turning a query-result document (JSON) into tables, lists,
//! CSV, DSV, JSON, or feeds, and for producing distribution/aggregation
//! reports over the same data.
//!
//! ## Usage
//!
//! ```bash
//! # Render a result document as a table
//! queryfmt rows.json
//!
//! # CSV with a custom separator
//! queryfmt rows.json --format csv --sep ";"
//!
//! # Numbered list in three columns
//! queryfmt rows.json --format ol --columns 3
//!
//! # Write an RSS feed to a file
//! queryfmt rows.json --format feed --out cities.xml
//!
//! # Distribution report, biggest buckets first
//! queryfmt report rows.json --sort desc --top 10
//!
//! # Raw JSON output
//! queryfmt rows.json --output json
//! ```

use std::io::Read;
use std::process::ExitCode;

use clap::{Arg, ArgAction, ArgMatches, Command};
use console::Style;
use outstanding::cli::{App, CommandContext, HandlerResult, Output, RunResult};
use outstanding::Theme;
use queryfmtlib::{
    distribution, format_number, sum, AggregateBy, AggregationResult, Environment, OutputMode,
    QueryResult, RenderConfig, ResultPrinter, SortOrder,
};
use serde::Serialize;

/// Include templates at compile time
const RENDER_TEMPLATE: &str = include_str!("../templates/render.jinja");
const REPORT_TEMPLATE: &str = include_str!("../templates/report_table.jinja");

/// Row data for the report template (pre-formatted)
#[derive(Debug, Serialize)]
struct ReportRow {
    /// Pre-padded label (left-aligned)
    label: String,
    /// Pre-padded count (right-aligned)
    count: String,
}

/// Data context for the report table template
#[derive(Debug, Serialize)]
struct ReportContext {
    label_header_formatted: String,
    count_header_formatted: String,
    separator: String,
    rows: Vec<ReportRow>,
    total_label: String,
    total_formatted: String,
}

/// Truncate a label to fit within max_len, adding ".." prefix if needed
fn truncate_label(label: &str, max_len: usize) -> String {
    if label.len() > max_len {
        format!("..{}", &label[label.len() - max_len + 2..])
    } else {
        label.to_string()
    }
}

/// Build the report template context from an aggregation
fn build_report_context(aggregated: &AggregationResult) -> ReportContext {
    let label_width = 40;
    let count_width = 10;

    let rows: Vec<ReportRow> = aggregated
        .iter()
        .map(|(label, value)| ReportRow {
            label: format!(
                "{:<width$}",
                truncate_label(label, label_width - 2),
                width = label_width
            ),
            count: format!("{:>width$}", format_number(value), width = count_width),
        })
        .collect();

    let total: f64 = aggregated.iter().map(|(_, value)| value).sum();

    ReportContext {
        label_header_formatted: format!("{:<width$}", "Value", width = label_width),
        count_header_formatted: format!("{:>width$}", "Count", width = count_width),
        separator: "-".repeat(label_width + 1 + count_width),
        rows,
        total_label: format!(
            "{:<width$}",
            format!("Total ({} values)", aggregated.len()),
            width = label_width
        ),
        total_formatted: format!("{:>width$}", format_number(total), width = count_width),
    }
}

/// Build the clap Command structure
fn build_command() -> Command {
    let root = Command::new("queryfmt")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Arthur Debert")
        .about("Render structured query results as tables, lists, CSV/DSV, JSON, and feeds")
        .subcommand(
            with_render_args(
                Command::new("render")
                    .about("Render a result document (default command)"),
            ),
        )
        .subcommand(
            Command::new("report")
                .about("Aggregate a result document into a distribution or sum report")
                .arg(
                    Arg::new("input")
                        .help("Result document to read ('-' for stdin)")
                        .default_value("-"),
                )
                .arg(
                    Arg::new("aggregate")
                        .long("aggregate")
                        .value_parser(["subject", "property"])
                        .help("Sum numeric values keyed by subject or property instead of counting"),
                )
                .arg(
                    Arg::new("sort")
                        .long("sort")
                        .value_parser(["none", "asc", "desc"])
                        .help("Sort entries by value"),
                )
                .arg(
                    Arg::new("top")
                        .long("top")
                        .help("Keep only the first N entries (after sorting)"),
                ),
        );

    with_render_args(root)
}

/// Attach the shared rendering arguments to a command
fn with_render_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("input")
            .help("Result document to read ('-' for stdin)")
            .default_value("-"),
    )
    .arg(
        Arg::new("format")
            .short('f')
            .long("format")
            .help("Output format (table, list, ul, ol, template, csv, dsv, json, rdf, feed)"),
    )
    .arg(
        Arg::new("sep")
            .long("sep")
            .help("Separator between list items / CSV columns"),
    )
    .arg(
        Arg::new("value-sep")
            .long("value-sep")
            .help("Separator between multiple values of one field"),
    )
    .arg(
        Arg::new("dsv-sep")
            .long("dsv-sep")
            .help("DSV field separator (single character, backslash not allowed)"),
    )
    .arg(
        Arg::new("headers")
            .long("headers")
            .value_parser(["show", "hide", "plain"])
            .help("Header row behavior"),
    )
    .arg(
        Arg::new("columns")
            .long("columns")
            .help("Number of columns for list layout"),
    )
    .arg(
        Arg::new("template")
            .short('t')
            .long("template")
            .help("Pack each row into this template"),
    )
    .arg(
        Arg::new("named-args")
            .long("named-args")
            .action(ArgAction::SetTrue)
            .help("Use column labels as template argument names"),
    )
    .arg(
        Arg::new("user-param")
            .long("user-param")
            .help("Extra parameter handed to every template call"),
    )
    .arg(
        Arg::new("distribution")
            .long("distribution")
            .action(ArgAction::SetTrue)
            .help("Count value occurrences instead of listing them"),
    )
    .arg(
        Arg::new("aggregate")
            .long("aggregate")
            .value_parser(["subject", "property"])
            .help("Sum numeric values keyed by subject or property"),
    )
    .arg(
        Arg::new("sort")
            .long("sort")
            .value_parser(["none", "asc", "desc"])
            .help("Sort aggregated entries by value"),
    )
    .arg(
        Arg::new("top")
            .long("top")
            .help("Keep only the first N aggregated entries"),
    )
    .arg(
        Arg::new("intro")
            .long("intro")
            .help("Text prepended to non-empty output"),
    )
    .arg(
        Arg::new("outro")
            .long("outro")
            .help("Text appended to non-empty output"),
    )
    .arg(
        Arg::new("default")
            .long("default")
            .help("Text shown when the result is empty"),
    )
    .arg(
        Arg::new("search-label")
            .long("search-label")
            .help("Label of the further-results link"),
    )
    .arg(
        Arg::new("no-link")
            .long("no-link")
            .action(ArgAction::SetTrue)
            .help("Never append a further-results link"),
    )
    .arg(
        Arg::new("bom")
            .long("bom")
            .action(ArgAction::SetTrue)
            .help("Emit a UTF-8 byte-order mark in CSV output"),
    )
    .arg(
        Arg::new("merge")
            .long("merge")
            .action(ArgAction::SetTrue)
            .help("Merge CSV rows sharing an identical first column"),
    )
    .arg(
        Arg::new("feed-type")
            .long("feed-type")
            .help("Feed flavor: rss or atom"),
    )
    .arg(
        Arg::new("feed-title")
            .long("feed-title")
            .help("Feed channel title"),
    )
    .arg(
        Arg::new("feed-description")
            .long("feed-description")
            .help("Feed channel description"),
    )
    .arg(
        Arg::new("compact")
            .long("compact")
            .action(ArgAction::SetTrue)
            .help("Compact JSON output instead of pretty-printed"),
    )
    .arg(
        Arg::new("filename")
            .long("filename")
            .help("Suggested download filename for file output"),
    )
    .arg(
        Arg::new("out")
            .short('o')
            .long("out")
            .help("Write file-mode output to this path"),
    )
}

/// Read and parse the result document from a file or stdin
fn load_result(input: &str) -> Result<QueryResult, anyhow::Error> {
    let text = if input == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        std::fs::read_to_string(input)?
    };
    let result: QueryResult = serde_json::from_str(&text)?;
    result.check_arity()?;
    Ok(result)
}

/// Map CLI flags onto the library's key/value configuration surface
fn build_config(matches: &ArgMatches) -> RenderConfig {
    let mut params: Vec<(&str, String)> = Vec::new();

    let string_options = [
        ("format", "format"),
        ("sep", "sep"),
        ("value-sep", "valuesep"),
        ("dsv-sep", "separator"),
        ("headers", "headers"),
        ("columns", "columns"),
        ("template", "template"),
        ("user-param", "userparam"),
        ("sort", "distributionsort"),
        ("top", "distributionlimit"),
        ("aggregate", "aggregation"),
        ("intro", "intro"),
        ("outro", "outro"),
        ("default", "default"),
        ("search-label", "searchlabel"),
        ("feed-type", "type"),
        ("feed-title", "title"),
        ("feed-description", "description"),
        ("filename", "filename"),
    ];
    for (arg, key) in string_options {
        if let Some(value) = matches.get_one::<String>(arg) {
            params.push((key, value.clone()));
        }
    }

    if matches.get_flag("named-args") {
        params.push(("named args", "true".to_string()));
    }
    if matches.get_flag("distribution") {
        params.push(("distribution", "true".to_string()));
    }
    if matches.get_flag("no-link") {
        params.push(("link", "none".to_string()));
    }
    if matches.get_flag("bom") {
        params.push(("bom", "true".to_string()));
    }
    if matches.get_flag("merge") {
        params.push(("merge", "true".to_string()));
    }
    if matches.get_flag("compact") {
        params.push(("prettyprint", "false".to_string()));
    }

    RenderConfig::from_params(params.iter().map(|(key, value)| (*key, value.as_str())))
}

/// Handler for the render command
fn render_handler(matches: &ArgMatches, ctx: &CommandContext) -> HandlerResult<serde_json::Value> {
    let input = matches
        .get_one::<String>("input")
        .map(|s| s.as_str())
        .unwrap_or("-");
    let result = load_result(input)?;
    let config = build_config(matches);
    let printer = ResultPrinter::new(config);

    // --out switches to file mode and writes the bytes to disk
    if let Some(out_path) = matches.get_one::<String>("out") {
        let file = printer.render_file(&result, &Environment::default())?;
        std::fs::write(out_path, &file.bytes)?;
        return Ok(Output::Render(serde_json::json!({
            "text": format!(
                "wrote {} bytes to {} ({})",
                file.bytes.len(),
                out_path,
                file.mime_type
            ),
        })));
    }

    // For JSON mode, return the raw result document
    if ctx.output_mode.is_structured() {
        return Ok(Output::Render(serde_json::to_value(&result)?));
    }

    let rendered = printer.render(&result, &Environment::default(), OutputMode::Wiki)?;
    Ok(Output::Render(serde_json::json!({
        "text": rendered.as_text(),
    })))
}

/// Handler for the report command
fn report_handler(matches: &ArgMatches, ctx: &CommandContext) -> HandlerResult<serde_json::Value> {
    let input = matches
        .get_one::<String>("input")
        .map(|s| s.as_str())
        .unwrap_or("-");
    let result = load_result(input)?;

    let mut aggregated = match matches.get_one::<String>("aggregate") {
        Some(by) => sum(
            &result,
            by.parse::<AggregateBy>().unwrap_or_default(),
        ),
        None => distribution(&result),
    };

    let order = matches
        .get_one::<String>("sort")
        .and_then(|s| s.parse::<SortOrder>().ok())
        .unwrap_or_default();
    aggregated.sort(order);

    if let Some(top) = matches.get_one::<String>("top").and_then(|s| s.parse().ok()) {
        aggregated.truncate(top);
    }

    // For JSON mode, return the raw mapping
    if ctx.output_mode.is_structured() {
        return Ok(Output::Render(serde_json::to_value(&aggregated)?));
    }

    let context = build_report_context(&aggregated);
    Ok(Output::Render(serde_json::to_value(&context)?))
}

/// Create the theme with styles
fn create_theme() -> Theme {
    Theme::new().add("category", Style::new().bold())
}

fn main() -> ExitCode {
    let cmd = build_command();
    let theme = create_theme();

    // Build the outstanding app with command handlers and run
    let result = App::builder()
        .theme(theme)
        .command("render", render_handler, RENDER_TEMPLATE)
        .command("report", report_handler, REPORT_TEMPLATE)
        .run_to_string(cmd, std::env::args());

    match result {
        RunResult::Handled(output) => {
            if !output.is_empty() {
                if output.starts_with("Error:") {
                    eprintln!("{}", output);
                    return ExitCode::FAILURE;
                }
                print!("{}", output);
            }
            ExitCode::SUCCESS
        }
        RunResult::Binary(_, _) => {
            // Not used in queryfmt
            ExitCode::SUCCESS
        }
        RunResult::NoMatch(matches) => {
            // Handle root command (no subcommand) - treat as render
            let output_mode = matches
                .get_one::<String>("_output_mode")
                .map(|s| match s.as_str() {
                    "json" => outstanding::OutputMode::Json,
                    "text" => outstanding::OutputMode::Text,
                    "term-debug" => outstanding::OutputMode::TermDebug,
                    "term" => outstanding::OutputMode::Term,
                    _ => outstanding::OutputMode::Auto,
                })
                .unwrap_or(outstanding::OutputMode::Auto);

            let ctx = CommandContext {
                output_mode,
                command_path: vec![],
            };

            match render_handler(&matches, &ctx) {
                Ok(Output::Render(value)) => {
                    if output_mode.is_structured() {
                        println!(
                            "{}",
                            serde_json::to_string_pretty(&value).unwrap_or_default()
                        );
                    } else {
                        let theme = create_theme();
                        match outstanding::render(RENDER_TEMPLATE, &value, &theme) {
                            Ok(output) => {
                                print!("{}", output);
                            }
                            Err(e) => {
                                eprintln!("Error: {e}");
                                return ExitCode::FAILURE;
                            }
                        }
                    }
                    ExitCode::SUCCESS
                }
                Ok(Output::Silent) => ExitCode::SUCCESS,
                Ok(Output::Binary { .. }) => ExitCode::SUCCESS,
                Err(e) => {
                    eprintln!("Error: {e}");
                    ExitCode::FAILURE
                }
            }
        }
    }
}
