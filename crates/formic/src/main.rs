use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, bail};
use async_trait::async_trait;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use formic_cdp::CdpBackend;
use formic_engine::audit::SessionAuditor;
use formic_engine::backend::Backend;
use formic_engine::config::{ConfigLoader, RunConfig};
use formic_engine::confirm::{ConfirmationChannel, ConfirmationSummary, Decision};
use formic_engine::inference::InferenceClient;
use formic_engine::jobs;
use formic_engine::resolve::FieldResolver;
use formic_engine::store::ProfileStore;
use formic_engine::workflow::{ConfirmMode, JobOutcome, JobWorkflow, WorkflowConfig};

#[derive(Parser)]
#[command(
    name = "formic",
    version,
    about = "Fills job application forms through your already-open browser session"
)]
struct Args {
    /// JSON file with an ordered list of {url, company, title, source?}
    #[arg(long, short = 'j')]
    jobs: Option<PathBuf>,

    /// Profile name under ~/.formic/profiles/
    #[arg(long, short = 'p')]
    profile: Option<String>,

    /// Direct path to a profile YAML (overrides --profile)
    #[arg(long)]
    profile_path: Option<PathBuf>,

    /// DevTools endpoint of the running browser
    #[arg(long)]
    cdp_url: Option<String>,

    /// Run configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Submit without prompting whenever every high-risk field resolved
    #[arg(long, conflicts_with = "watch_browser")]
    auto_proceed: bool,

    /// Fill the form, then wait for you to click Submit in the browser
    #[arg(long)]
    watch_browser: bool,

    /// List available profiles and exit
    #[arg(long)]
    list_profiles: bool,

    /// Process at most this many jobs from the list
    #[arg(long)]
    max_jobs: Option<usize>,

    /// Override the session log directory
    #[arg(long)]
    logs_dir: Option<PathBuf>,
}

/// Terminal prompt confirmation: render the summary, read one line.
struct PromptChannel;

#[async_trait]
impl ConfirmationChannel for PromptChannel {
    async fn confirm(&mut self, summary: &ConfirmationSummary) -> std::io::Result<Decision> {
        println!("{}", summary.render());
        print!("Proceed with submission? [y/N] ");
        use std::io::Write;
        std::io::stdout().flush()?;

        let mut line = String::new();
        BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
        let answer = line.trim().to_lowercase();
        Ok(if answer == "y" || answer == "yes" {
            Decision::Proceed
        } else {
            Decision::Decline
        })
    }
}

fn effective_config(args: &Args, mut config: RunConfig) -> RunConfig {
    if let Some(url) = &args.cdp_url {
        config.cdp_url = url.clone();
    }
    if let Some(dir) = &args.logs_dir {
        config.logs_dir = dir.clone();
    }
    if args.auto_proceed {
        config.auto_proceed = true;
    }
    if args.watch_browser {
        config.watch_browser = true;
    }
    config
}

fn workflow_config(config: &RunConfig) -> WorkflowConfig {
    let confirm_mode = if config.auto_proceed {
        ConfirmMode::AutoProceed
    } else if config.watch_browser {
        ConfirmMode::WatchBrowser
    } else {
        ConfirmMode::Prompt
    };
    WorkflowConfig {
        confirm_mode,
        confirm_timeout: match config.confirm_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        },
        ..WorkflowConfig::default()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout belongs to the operator dialogue.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if args.list_profiles {
        let profiles = ProfileStore::available_profiles();
        if profiles.is_empty() {
            println!("No profiles found. Create ~/.formic/profiles/<name>/profile.yaml");
        } else {
            println!("Available profiles:");
            for name in profiles {
                println!("  - {name}");
            }
        }
        return Ok(());
    }

    let base_config = match &args.config {
        Some(path) => ConfigLoader::load_from(path).await?,
        None => ConfigLoader::load_default().await?,
    };
    let config = effective_config(&args, base_config);

    let mut store = match (&args.profile_path, &args.profile) {
        (Some(path), _) => ProfileStore::load(path)?,
        (None, Some(name)) => ProfileStore::load_named(name)?,
        (None, None) => ProfileStore::load_named("default")?,
    };
    tracing::info!("profile loaded");

    let Some(jobs_path) = &args.jobs else {
        bail!("no jobs file given; pass --jobs <file>");
    };
    let job_list = jobs::load_jobs(jobs_path)?;
    let job_list: Vec<_> = match args.max_jobs {
        Some(cap) => job_list.into_iter().take(cap).collect(),
        None => job_list,
    };
    tracing::info!(count = job_list.len(), "jobs loaded");

    let inference = InferenceClient::from_env(config.inference_model.clone());
    match &inference {
        Some(_) => tracing::info!("inference tier enabled"),
        None => tracing::info!("inference tier disabled (no ANTHROPIC_API_KEY)"),
    }
    let resolver = FieldResolver::new(inference);

    let mut auditor = SessionAuditor::new(&config.logs_dir, config.retention)?;
    tracing::info!(dir = %auditor.session_dir().display(), "session log started");

    let mut backend = CdpBackend::new(config.cdp_url.clone());
    if let Err(e) = backend.attach().await {
        bail!(
            "could not attach to the browser: {e}\n\
             Start Chrome with: chrome --remote-debugging-port=9222"
        );
    }

    let abort = Arc::new(AtomicBool::new(false));
    {
        let abort = abort.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("abort requested; finishing current job as aborted");
                abort.store(true, Ordering::SeqCst);
            }
        });
    }

    let wf_config = workflow_config(&config);
    let mut previous_company: Option<String> = None;

    for (index, job) in job_list.iter().enumerate() {
        if abort.load(Ordering::SeqCst) {
            break;
        }
        if index > 0 {
            // Courtesy pacing toward the target sites; longer when we move
            // to a different company.
            let delay = if previous_company.as_deref() == Some(job.company.as_str()) {
                Duration::from_secs(config.job_delay_secs)
            } else {
                Duration::from_secs(config.company_delay_secs)
            };
            tokio::time::sleep(delay).await;
        }
        previous_company = Some(job.company.clone());

        println!(
            "\n[{}/{}] {} - {}",
            index + 1,
            job_list.len(),
            job.company,
            job.title
        );

        let mut channel = PromptChannel;
        let outcome = JobWorkflow::new(
            &mut backend,
            &mut store,
            &resolver,
            &mut auditor,
            Some(&mut channel),
            &wf_config,
            abort.clone(),
        )
        .run(job)
        .await;

        match &outcome {
            JobOutcome::Succeeded => println!("  submitted"),
            JobOutcome::Skipped(reason) => println!("  skipped: {reason}"),
            JobOutcome::Failed(_) => {
                println!("  failed: {}", outcome.describe().unwrap_or_default())
            }
            JobOutcome::Aborted(_) => {
                println!("  aborted: {}", outcome.describe().unwrap_or_default())
            }
        }
        if outcome.is_blocking_challenge() {
            println!("  a verification challenge blocked this page; finish it manually");
        }

        // Learned-store writes land between attempts only.
        if let Err(e) = store.flush() {
            tracing::warn!(error = %e, "could not persist profile updates");
        }

        if outcome.is_operator_abort() {
            break;
        }
    }

    auditor.finalize().context("could not finalize session record")?;
    println!("{}", auditor.report());

    backend.close().await.ok();
    Ok(())
}
