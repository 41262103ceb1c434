//! resume-tailor: PII-safe résumé tailoring against a job description

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use resume_tailor::cli::{self, Cli, Commands, ConfigAction};
use resume_tailor::config::{Config, OutputFormat};
use resume_tailor::input::InputManager;
use resume_tailor::llm::analyzer::JobAnalyzer;
use resume_tailor::llm::client::HttpOracle;
use resume_tailor::output::persist::{self, ArtifactPaths};
use resume_tailor::output::{ConsoleFormatter, OptimizationReport, Renderer};
use resume_tailor::processing::session::normalize_label;
use resume_tailor::processing::{PiiSanitizer, ResumeImporter, ResumeMerger, Selection, TailoringSession};
use resume_tailor::{Result, TailorError};
use serde_json::json;
use std::io::{BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config_path = cli.config.clone().unwrap_or_else(Config::config_path);
    let config = match Config::load_from(&config_path) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli.command, config, &config_path).await {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

async fn run_command(command: Commands, config: Config, config_path: &Path) -> Result<()> {
    match command {
        Commands::Import { resume, output } => {
            cli::validate_file_extension(&resume, &["pdf", "txt", "md", "markdown"])
                .map_err(|e| TailorError::InvalidInput(format!("Résumé document: {}", e)))?;

            let text = InputManager::new().extract_resume_text(&resume).await?;
            let oracle = HttpOracle::new(config.oracle.clone())?;

            let pb = spinner("Parsing résumé (identifying details stay local)...");
            let record = ResumeImporter::new(&oracle).import_text(&text).await;
            pb.finish_and_clear();
            let record = record?;

            let output = output.unwrap_or_else(|| resume.with_extension("json"));
            persist::write_atomic(&output, record.to_pretty_json()?.as_bytes())?;
            info!("Imported record written to {}", output.display());
            println!(
                "📥 Imported {} ({} jobs, {} skills) → {}",
                record.name().unwrap_or("Unknown"),
                record.experience.len(),
                record.skills.skill_count(),
                output.display()
            );
        }

        Commands::Sanitize { resume, output } => {
            let record = InputManager::new().load_record(&resume).await?;
            let anonymized = PiiSanitizer::sanitized_json_string(&record)?;

            match output {
                Some(path) => {
                    persist::write_atomic(&path, anonymized.as_bytes())?;
                    println!("🔒 Anonymized record written to {}", path.display());
                }
                None => println!("{}", anonymized),
            }
        }

        Commands::Analyze { resume, job, detailed, save } => {
            cli::validate_file_extension(&job, &["txt", "md", "markdown"])
                .map_err(|e| TailorError::InvalidInput(format!("Job description file: {}", e)))?;

            let mut input = InputManager::new();
            let record = input.load_record(&resume).await?;
            let job_text = input.extract_text(&job).await?;
            let anonymized = PiiSanitizer::sanitize(&record);

            let oracle = HttpOracle::new(config.oracle.clone())?;
            let analyzer = JobAnalyzer::new(&oracle);

            let pb = spinner("Extracting job requirements...");
            let requirements = analyzer.extract_requirements(&job_text).await;
            pb.finish_and_clear();
            let requirements = requirements?;

            let pb = spinner("Scoring résumé against requirements...");
            let analysis = analyzer.score_match(&anonymized, &requirements).await;
            pb.finish_and_clear();
            let analysis = analysis?;

            let formatter = ConsoleFormatter::new(config.output.color_output, detailed || config.output.detailed);
            println!("{}", formatter.format_match_analysis(&analysis, Some(&requirements)));

            if let Some(path) = save {
                let content = serde_json::to_string_pretty(&json!({
                    "requirements": requirements,
                    "match_analysis": analysis,
                }))?;
                persist::write_atomic(&path, content.as_bytes())?;
                println!("💾 Analysis saved to {}", path.display());
            }
        }

        Commands::Tailor {
            resume,
            job,
            label,
            select,
            modify,
            out_dir,
            format,
            no_rescore,
            strict,
            detailed,
        } => {
            cli::validate_file_extension(&resume, &["json"])
                .map_err(|e| TailorError::InvalidInput(format!("Résumé file: {}", e)))?;
            cli::validate_file_extension(&job, &["txt", "md", "markdown"])
                .map_err(|e| TailorError::InvalidInput(format!("Job description file: {}", e)))?;

            let document_format = match format {
                Some(f) => cli::parse_output_format(&f).map_err(TailorError::InvalidInput)?,
                None => config.output.format,
            };
            let label = label.unwrap_or_else(|| config.tailoring.default_label.clone());
            let out_dir = out_dir.unwrap_or_else(|| config.output.directory.clone());
            let formatter = ConsoleFormatter::new(config.output.color_output, detailed || config.output.detailed);

            println!("🚀 Résumé tailoring");
            println!("📄 Résumé: {}", resume.display());
            println!("💼 Job Description: {}", job.display());
            println!("🏷️  Label: {}", normalize_label(&label));

            let mut input = InputManager::new();
            let record = input.load_record(&resume).await?;
            let job_text = input.extract_text(&job).await?;

            let oracle = HttpOracle::new(config.oracle.clone())?;
            let mut session = TailoringSession::new(record, &label);

            let pb = spinner("Analyzing job description and current match...");
            let analyzed = session.analyze(&oracle, &job_text).await.map(|_| ());
            pb.finish_and_clear();
            analyzed?;
            if let Some(analysis) = session.analysis() {
                println!("{}", formatter.format_match_analysis(analysis, session.requirements()));
            }

            let pb = spinner("Generating suggestions...");
            let generated = session.generate_suggestions(&oracle).await;
            pb.finish_and_clear();
            if generated? == 0 {
                warn!("The model returned no suggestions; the record will be left unchanged");
            }
            println!("{}", formatter.format_suggestions(session.ledger().all()));

            let interactive = select.is_none() && std::io::stdin().is_terminal() && !session.ledger().is_empty();
            let selection = match select {
                Some(text) => text.parse::<Selection>()?,
                None if interactive => prompt_selection()?,
                None => Selection::All,
            };
            let chosen = session.ledger_mut().apply_selection(&selection);
            for (id, value) in &modify {
                session.ledger_mut().modify(*id, value);
            }
            if interactive && modify.is_empty() && chosen > 0 {
                for (id, value) in prompt_modifications()? {
                    session.ledger_mut().modify(id, &value);
                }
            }
            println!(
                "✅ {} of {} suggestions selected",
                session.ledger().selected_count(),
                session.ledger().len()
            );

            let pb = spinner("Applying selected edits...");
            let applied = session.apply(&oracle).await.map(|_| ());
            pb.finish_and_clear();
            applied?;

            let outcome = session.finalize(strict || config.tailoring.strict_audit)?;
            print!("{}", formatter.format_alignment(&outcome.alignment));

            let mut report = OptimizationReport::new(&session, &outcome, &resume);
            if config.tailoring.rescore && !no_rescore {
                let pb = spinner("Scoring tailored résumé...");
                let rescored = session.rescore(&oracle, &outcome.record).await;
                pb.finish_and_clear();
                match rescored {
                    Ok(after) => report = report.with_rescore(after.overall_match_score),
                    Err(e) => warn!("Rescoring failed, report will omit the new score: {}", e),
                }
            }

            let paths = ArtifactPaths::new(&out_dir, session.label(), Some(document_format), &Local::now());
            persist::write_atomic(&paths.record, outcome.record.to_pretty_json()?.as_bytes())?;
            if let Some(document_path) = &paths.document {
                let bytes = Renderer::default().render(&outcome.record, document_format)?;
                persist::write_atomic(document_path, &bytes)?;
            }
            let report = report.with_artifacts(Some(&paths.record), paths.document.as_deref());
            persist::write_atomic(&paths.report, report.to_pretty_json()?.as_bytes())?;

            println!("{}", formatter.format_run_summary(&report));
            println!("  📊 {}", paths.report.display());
        }

        Commands::Merge {
            original,
            edited,
            output,
            label,
            prior_score,
            edits,
        } => {
            let input = InputManager::new();
            let original = input.load_record(&original).await?;
            let edited = input.load_record(&edited).await?;

            let (merged, alignment) = ResumeMerger::merge_with_report(&original, &edited);
            ResumeMerger::verify_no_leaks(&original, &merged)?;

            let merged = match label {
                Some(label) => ResumeMerger::add_metadata(&merged, &normalize_label(&label), prior_score, edits),
                None => merged,
            };

            let formatter = ConsoleFormatter::new(config.output.color_output, false);
            print!("{}", formatter.format_alignment(&alignment));
            persist::write_atomic(&output, merged.to_pretty_json()?.as_bytes())?;
            println!("🔗 Merged record written to {}", output.display());
        }

        Commands::Render { resume, format, output } => {
            let format = cli::parse_output_format(&format).map_err(TailorError::InvalidInput)?;
            let record = InputManager::new().load_record(&resume).await?;
            let output = output.unwrap_or_else(|| default_render_path(&resume, format));

            let bytes = Renderer::default().render(&record, format)?;
            persist::write_atomic(&output, &bytes)?;
            println!("🖨️  Rendered {} to {}", format.extension(), output.display());
        }

        Commands::Config { action } => match action {
            Some(ConfigAction::Show) | None => {
                println!("⚙️  Current Configuration ({})\n", config_path.display());
                println!("{}", config.to_toml()?);
                match config.oracle.api_key() {
                    Some(_) => println!("{} ${} is set", "🔑".green(), config.oracle.api_key_env),
                    None => println!("{} ${} is not set", "🔑".red(), config.oracle.api_key_env),
                }
            }

            Some(ConfigAction::Reset) => {
                println!("🔄 Resetting configuration to defaults...");
                Config::default().save_to(config_path)?;
                println!("✅ Configuration reset successfully!");
            }

            Some(ConfigAction::Path) => println!("{}", config_path.display()),
        },
    }

    Ok(())
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn read_line(prompt: &str) -> anyhow::Result<String> {
    print!("{}", prompt);
    std::io::stdout().flush().context("Failed to flush prompt")?;
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim().to_string())
}

fn prompt_selection() -> Result<Selection> {
    loop {
        let answer = read_line(&format!(
            "\n{} ",
            "Select suggestions (all / high / medium / low / 1,2,5):".bold()
        ))?;
        let answer = if answer.is_empty() { "all".to_string() } else { answer };
        match answer.parse::<Selection>() {
            Ok(selection) => return Ok(selection),
            Err(e) => println!("{} {}", "✗".red(), e),
        }
    }
}

fn prompt_modifications() -> Result<Vec<(u32, String)>> {
    let mut modifications = Vec::new();
    loop {
        let answer = read_line("Modify a suggestion value? (ID=new value, blank to continue): ")?;
        if answer.is_empty() {
            return Ok(modifications);
        }
        match cli::parse_modification(&answer) {
            Ok(modification) => {
                info!("Suggestion {} will use the new value", modification.0);
                modifications.push(modification);
            }
            Err(e) => println!("{} {}", "✗".red(), e),
        }
    }
}

fn default_render_path(resume: &Path, format: OutputFormat) -> PathBuf {
    let stem = resume
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "resume".to_string());
    let name = match format {
        OutputFormat::Json => format!("{}_rendered.json", stem),
        _ => format!("{}.{}", stem, format.extension()),
    };
    resume.with_file_name(name)
}
