use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use context_core::{build_prompt, ContextIndex};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "lookup")]
#[command(about = "Look up image analyses by question id or media URL", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the analysis for a question and/or media URL as JSON
    Lookup {
        #[command(flatten)]
        source: Source,
        #[command(flatten)]
        target: Target,
    },
    /// Print the LLM prompt for a student question
    Prompt {
        #[command(flatten)]
        source: Source,
        #[command(flatten)]
        target: Target,
        /// Question text asked by the student
        #[arg(long)]
        question: String,
    },
}

#[derive(Args)]
struct Source {
    /// JSON file or directory of JSON files; may be repeated
    #[arg(long = "json-path", required = true)]
    json_paths: Vec<PathBuf>,
}

#[derive(Args)]
struct Target {
    /// Question id to look up
    #[arg(long)]
    question_id: Option<String>,
    /// Image or video URL to look up
    #[arg(long)]
    url: Option<String>,
}

impl Target {
    fn is_empty(&self) -> bool {
        self.question_id.as_deref().map_or(true, str::is_empty) && self.url.as_deref().map_or(true, str::is_empty)
    }
}

fn main() -> ExitCode {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(std::io::stderr).init();
    let cli = Cli::parse();

    match run(cli.command) {
        Ok(out) => {
            println!("{out}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::debug!(error = ?err, "lookup failed");
            eprintln!("{}", error_payload(&err));
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<String> {
    match command {
        Commands::Lookup { source, target } => {
            if target.is_empty() {
                bail!("either --question-id or --url must be given");
            }
            let index = ContextIndex::load(&source.json_paths)?;
            lookup_json(&index, &target)
        }
        Commands::Prompt { source, target, question } => {
            let index = ContextIndex::load(&source.json_paths)?;
            let context = index.get_context(target.question_id.as_deref(), target.url.as_deref());
            Ok(build_prompt(&question, context))
        }
    }
}

/// Pretty JSON of the matching analysis, `null` when nothing matches.
fn lookup_json(index: &ContextIndex, target: &Target) -> Result<String> {
    let context = index.get_context(target.question_id.as_deref(), target.url.as_deref());
    Ok(serde_json::to_string_pretty(&context)?)
}

fn error_payload(err: &anyhow::Error) -> String {
    serde_json::json!({ "error": err.to_string() }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn target(question_id: Option<&str>, url: Option<&str>) -> Target {
        Target { question_id: question_id.map(String::from), url: url.map(String::from) }
    }

    fn sample_index() -> (tempfile::TempDir, ContextIndex) {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("okruh1.json"),
            r#"{ "výsledky_okruhu": [ { "id_otazky": "24030003", "url": [
                { "adresa": "https://x/240707.png", "analyza": { "shrnuti": "Výjezd z parkoviště", "poznatky_relevantni_k_odpovedim": ["Dát přednost"] } }
            ] } ] }"#,
        )
        .unwrap();
        let index = ContextIndex::load([dir.path()]).unwrap();
        (dir, index)
    }

    #[test]
    fn json_path_is_required_and_repeatable() {
        assert!(Cli::try_parse_from(["lookup", "lookup", "--question-id", "1"]).is_err());
        let cli = Cli::try_parse_from(["lookup", "lookup", "--json-path", "a", "--json-path", "b", "--url", "u"]).unwrap();
        match cli.command {
            Commands::Lookup { source, target } => {
                assert_eq!(source.json_paths, vec![PathBuf::from("a"), PathBuf::from("b")]);
                assert_eq!(target.url.as_deref(), Some("u"));
            }
            Commands::Prompt { .. } => panic!("wrong subcommand"),
        }
    }

    #[test]
    fn lookup_without_identifier_fails() {
        let (dir, _) = sample_index();
        let command = Commands::Lookup {
            source: Source { json_paths: vec![dir.path().to_path_buf()] },
            target: target(None, Some("")),
        };
        let err = run(command).unwrap_err();
        assert!(error_payload(&err).contains("--question-id"));
    }

    #[test]
    fn lookup_prints_indented_json_or_null() {
        let (_dir, index) = sample_index();
        let found = lookup_json(&index, &target(Some("24030003"), None)).unwrap();
        assert!(found.starts_with("{\n  \""));
        assert!(found.contains("Výjezd z parkoviště"));

        let missing = lookup_json(&index, &target(Some("24030003"), Some("https://x/other.png"))).unwrap();
        assert_eq!(missing, "null");
    }

    #[test]
    fn lookup_keeps_document_key_order() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("okruh.json"),
            r#"{ "výsledky_okruhu": [ { "id_otazky": "Q1", "url": [
                { "adresa": "U1", "analyza": { "zz": 1, "shrnuti": "s", "aa": 2 } }
            ] } ] }"#,
        )
        .unwrap();
        let index = ContextIndex::load([dir.path()]).unwrap();
        let out = lookup_json(&index, &target(Some("Q1"), None)).unwrap();
        assert_eq!(out, "{\n  \"zz\": 1,\n  \"shrnuti\": \"s\",\n  \"aa\": 2\n}");
    }

    #[test]
    fn load_errors_become_payloads() {
        let dir = tempdir().unwrap();
        let command = Commands::Lookup {
            source: Source { json_paths: vec![dir.path().join("missing")] },
            target: target(Some("1"), None),
        };
        let payload = error_payload(&run(command).unwrap_err());
        let parsed: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert!(parsed["error"].as_str().unwrap().contains("no .json documents"));
    }

    #[test]
    fn prompt_uses_context() {
        let (dir, _) = sample_index();
        let command = Commands::Prompt {
            source: Source { json_paths: vec![dir.path().to_path_buf()] },
            target: target(None, Some("https://x/240707.png")),
            question: "Co musím udělat?".into(),
        };
        let prompt = run(command).unwrap();
        assert!(prompt.starts_with("Otázka studenta: Co musím udělat?\n\n"));
        assert!(prompt.contains("Důležité poznatky: Dát přednost"));
    }
}
