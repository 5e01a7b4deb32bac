//! Minimal CLI: schema + request documents → (rule map | qualified rules)
use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use rayon::prelude::*;
use serde_json::Value;

use input_rules::rules::{ChronoDates, DEFAULT_MAX_DEPTH, RuleMap, Rules, RulesConfig, qualify_rules};
use input_rules::schema::{RuleValue, Schema, load_schema};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// derive validator rule sets for nested request input from a typed input schema
#[derive(Parser, Debug)]
#[command(name = "input-rules", version, about)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// derive the path → rules mapping for each request document
    Derive(DeriveOut),
    /// qualify field references in rules under a path prefix
    Qualify(QualifyOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select the arguments object in each document (e.g. /variables)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document.
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns or '-' for stdin
    #[arg(long, short, num_args = 1.., required_unless_present = "check_schema")]
    input: Vec<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Text,
}

#[derive(clap::Parser, Debug)]
struct DeriveOut {
    /// schema document (.json) describing input types and operation arguments
    #[arg(long, short)]
    schema: PathBuf,

    #[command(flatten)]
    input_settings: InputSettings,

    /// composite nesting levels allowed before a document is rejected
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// output file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// load the schema, list its arguments and stop before reading any input
    #[arg(long)]
    check_schema: bool,
}

#[derive(clap::Parser, Debug)]
struct QualifyOut {
    /// dotted path the rules are nested under (e.g. contract or items.0)
    #[arg(long, short)]
    prefix: String,

    /// rules in `name:arg1,arg2` form
    #[arg(required = true)]
    rules: Vec<String>,

    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

/// One request's submitted arguments.
struct Document {
    source: String,
    value: Value,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load(&self) -> Result<Vec<Document>> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .context("failed to resolve input file paths")?;

        let mut documents = Vec::new();
        for source_path in source_paths {
            let source_path_str = source_path.to_string_lossy().to_string();
            let source = if source_path_str == "-" {
                let mut buf = String::new();
                std::io::stdin().read_to_string(&mut buf).context("failed to read stdin")?;
                buf
            } else {
                std::fs::read_to_string(&source_path)
                    .with_context(|| format!("failed to read source file {source_path_str}"))?
            };

            if self.ndjson {
                for (line_no, line) in source.lines().enumerate() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let label = format!("{source_path_str}:{}", line_no + 1);
                    let json_value = serde_json::from_str::<Value>(line)
                        .with_context(|| format!("failed to parse JSON line ({label})"))?;
                    self.push(&mut documents, label, json_value)?;
                }
            } else {
                let json_value = serde_json::from_str::<Value>(&source)
                    .with_context(|| format!("failed to parse JSON source file ({source_path_str})"))?;
                self.push(&mut documents, source_path_str, json_value)?;
            }
        }
        Ok(documents)
    }

    fn push(&self, documents: &mut Vec<Document>, source: String, json_value: Value) -> Result<()> {
        let json_value = match self.json_pointer.as_deref() {
            None => json_value,
            Some(pointer) => match json_value.pointer(pointer) {
                Some(selected) => selected.clone(),
                None => bail!("JSON pointer {pointer} matched nothing in {source}"),
            },
        };
        match self.jq_expr.as_ref() {
            None => documents.push(Document { source, value: json_value }),
            Some(jq_expr) => {
                let outputs = crate::jq_exec::run_jaq(jq_expr, &json_value)
                    .with_context(|| format!("failed to apply jq expression to {source}"))?;
                let many = outputs.len() > 1;
                for (index, value) in outputs.into_iter().enumerate() {
                    let source = if many { format!("{source}#{index}") } else { source.clone() };
                    documents.push(Document { source, value });
                }
            }
        }
        Ok(())
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Derive(target) => {
                // 1) schema + documents
                let schema = load_schema(&target.schema)?;
                if target.check_schema {
                    return write_out(target.out.as_ref(), &render_arguments(&schema));
                }
                let documents = target.input_settings.load()?;
                let config = RulesConfig::default().with_max_depth(target.max_depth);
                tracing::info!(documents = documents.len(), "deriving rules");

                // 2) one independent pass per document
                let derived = documents
                    .par_iter()
                    .map(|doc| {
                        Rules::new(schema.arguments(), &doc.value)
                            .with_config(config.clone())
                            .get()
                            .with_context(|| format!("failed to derive rules for {}", doc.source))
                            .map(|rules| (doc.source.as_str(), rules))
                    })
                    .collect::<Result<Vec<_>>>()?;

                // 3) render
                let rendered = match target.format {
                    Format::Json => render_json(&derived)?,
                    Format::Text => render_text(&derived),
                };
                write_out(target.out.as_ref(), &rendered)
            }
            Command::Qualify(target) => {
                let rules = qualify_rules(target.rules.clone(), Some(target.prefix.as_str()), &ChronoDates)?;
                let rendered = match target.format {
                    Format::Json => serde_json::to_string_pretty(&rules)?,
                    Format::Text => rules.join("\n"),
                };
                write_out(None, &rendered)
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn render_json(derived: &[(&str, RuleMap)]) -> Result<String> {
    if let [(_, rules)] = derived {
        return Ok(serde_json::to_string_pretty(rules)?);
    }
    let by_source = derived
        .iter()
        .map(|(source, rules)| Ok((source.to_string(), serde_json::to_value(rules)?)))
        .collect::<Result<serde_json::Map<_, _>>>()?;
    Ok(serde_json::to_string_pretty(&by_source)?)
}

fn render_text(derived: &[(&str, RuleMap)]) -> String {
    let mut out = String::new();
    for (source, rules) in derived {
        if derived.len() > 1 {
            out.push_str(&format!("{}\n", format!("# {source}").bold()));
        }
        for (key, value) in rules.iter() {
            let joined = match value {
                RuleValue::One(rule) => rule.clone(),
                RuleValue::List(list) => list.join(" | "),
            };
            out.push_str(&format!("{} => {joined}\n", key.cyan()));
        }
    }
    out
}

fn render_arguments(schema: &Schema) -> String {
    schema
        .arguments()
        .values()
        .map(|field| format!("{}: {}", field.name.cyan(), field.ty))
        .collect::<Vec<_>>()
        .join("\n")
}

fn write_out(out: Option<&PathBuf>, rendered: &str) -> Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(out, rendered)
                .with_context(|| format!("failed to write {}", out.display()))
        }
        None => {
            println!("{rendered}");
            Ok(())
        }
    }
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{' ))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                // Pattern was explicitly a glob but matched nothing -> surface as an error
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            // Treat as a literal path ('-' included)
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_derive_arguments() {
        let cli = CommandLineInterface::try_parse_from([
            "input-rules", "derive", "--schema", "schema.json", "-i", "a.json", "b.json",
            "--json-pointer", "/variables", "--format", "text", "--max-depth", "4",
        ])
        .unwrap();
        match cli.cmd {
            Command::Derive(target) => {
                assert_eq!(target.input_settings.input, ["a.json", "b.json"]);
                assert_eq!(target.input_settings.json_pointer.as_deref(), Some("/variables"));
                assert_eq!(target.format, Format::Text);
                assert_eq!(target.max_depth, 4);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn schema_check_needs_no_input() {
        let cli = CommandLineInterface::try_parse_from([
            "input-rules", "derive", "--schema", "schema.json", "--check-schema",
        ])
        .unwrap();
        assert!(matches!(cli.cmd, Command::Derive(ref target) if target.check_schema));

        let missing = CommandLineInterface::try_parse_from(["input-rules", "derive", "--schema", "schema.json"]);
        assert!(missing.is_err());
    }

    #[test]
    fn schema_check_lists_arguments_with_their_types() {
        colored::control::set_override(false);
        let schema = input_rules::schema::parse_schema(r#"{
            "types": { "LineInput": { "fields": { "name": { "type": "String!" } } } },
            "arguments": {
                "lines": { "type": "[LineInput!]!" },
                "id":    { "type": "ID" }
            }
        }"#)
        .unwrap();
        assert_eq!(render_arguments(&schema), "lines: [LineInput!]!\nid: ID");
    }

    #[test]
    fn qualify_requires_rules() {
        assert!(CommandLineInterface::try_parse_from(["input-rules", "qualify", "--prefix", "c"]).is_err());
    }

    #[test]
    fn literal_paths_pass_through() {
        let paths = resolve_file_path_patterns(["-", "missing.json"]).unwrap();
        assert_eq!(paths, [PathBuf::from("-"), PathBuf::from("missing.json")]);
    }

    #[test]
    fn empty_glob_is_an_error() {
        assert!(resolve_file_path_patterns(["/nonexistent-dir-for-tests/*.json"]).is_err());
    }

    #[test]
    fn text_rendering_lists_every_key() {
        colored::control::set_override(false);
        let mut rules = RuleMap::default();
        rules.insert("contract.end".into(), RuleValue::List(vec!["gt:contract.start".into(), "int".into()]));
        let text = render_text(&[("a.json", rules)]);
        assert_eq!(text, "contract.end => gt:contract.start | int\n");
    }
}
