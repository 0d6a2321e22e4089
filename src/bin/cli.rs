use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use dialoguer::{Confirm, Input};
use dotenvy::dotenv;
use learnhub::cli;
use learnhub::modules::imports::export::{export_credentials_to_csv, generate_csv_template};
use learnhub::modules::imports::service::ImportOptions;
use learnhub::modules::schools::PgSchoolStore;
use learnhub::modules::students::PgStudentStore;
use learnhub_auth::AdminRole;
use learnhub_config::{ImportConfig, JwtConfig};
use learnhub_db::PgPool;
use learnhub_models::ids::SchoolId;
use learnhub_models::schools::CreateSchoolDto;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "learnhub-cli")]
#[command(about = "learnhub CLI - roster tools for operators", long_about = None)]
struct Cli {
    /// Overrides DATABASE_URL
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the sample import CSV
    Template {
        /// Output file (stdout if omitted)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },
    /// Check a CSV file without importing it
    Validate {
        file: PathBuf,
    },
    /// Import students from a CSV file
    Import {
        file: PathBuf,

        #[arg(short = 's', long)]
        school_id: Uuid,

        /// Import the valid rows and report the rest
        #[arg(long)]
        skip_invalid: bool,

        /// Where to write the credentials sheet
        #[arg(short = 'o', long, default_value = "credentials.csv")]
        output: PathBuf,

        /// Do not ask for confirmation
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Create a school
    CreateSchool {
        #[arg(short = 'n', long)]
        name: Option<String>,

        /// Short code used as the username prefix, e.g. SCH-RPS
        #[arg(short = 'c', long)]
        code: Option<String>,

        #[arg(short = 'a', long)]
        address: Option<String>,
    },
    /// Issue an admin access token
    IssueToken {
        /// system_admin or school_admin
        #[arg(short = 'r', long)]
        role: AdminRole,

        /// Who the token is for, usually an email
        #[arg(long)]
        subject: String,

        /// Required for school_admin
        #[arg(short = 's', long)]
        school_id: Option<Uuid>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Template { output } => handle_template(output),
        Commands::Validate { file } => handle_validate(&file),
        Commands::Import {
            file,
            school_id,
            skip_invalid,
            output,
            yes,
        } => {
            let pool = connect(cli.database_url.as_deref()).await?;
            handle_import(&pool, &file, school_id, skip_invalid, &output, yes).await
        }
        Commands::CreateSchool {
            name,
            code,
            address,
        } => {
            let pool = connect(cli.database_url.as_deref()).await?;
            handle_create_school(&pool, name, code, address).await
        }
        Commands::IssueToken {
            role,
            subject,
            school_id,
        } => {
            let token = cli::issue_token(&subject, role, school_id, &JwtConfig::from_env())?;
            println!("{}", token);
            Ok(())
        }
    }
}

async fn connect(database_url: Option<&str>) -> anyhow::Result<PgPool> {
    let pool = match database_url {
        Some(url) => learnhub_db::connect(url).await?,
        None => learnhub_db::init_db_pool().await?,
    };
    learnhub::db::run_migrations(&pool).await?;
    Ok(pool)
}

fn handle_template(output: Option<PathBuf>) -> anyhow::Result<()> {
    let template = generate_csv_template()?;
    match output {
        Some(path) => {
            std::fs::write(&path, template)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("✅ Template written to {}", path.display());
        }
        None => print!("{}", template),
    }
    Ok(())
}

fn handle_validate(file: &Path) -> anyhow::Result<()> {
    let outcome = cli::validate_file(file, &ImportConfig::from_env())?;
    print!("{}", cli::render_outcome(&outcome));
    if outcome.has_errors {
        std::process::exit(1);
    }
    Ok(())
}

async fn handle_import(
    pool: &PgPool,
    file: &Path,
    school_id: Uuid,
    skip_invalid: bool,
    output: &Path,
    yes: bool,
) -> anyhow::Result<()> {
    let config = ImportConfig::from_env();
    let content = cli::read_csv(file)?;

    let outcome = cli::validate_file(file, &config)?;
    print!("{}", cli::render_outcome(&outcome));
    if outcome.valid_rows == 0 {
        anyhow::bail!("Nothing to import");
    }

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Import {} students?", outcome.valid_rows))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Aborted");
            return Ok(());
        }
    }

    let students = PgStudentStore::new(pool.clone());
    let schools = PgSchoolStore::new(pool.clone());
    let report = cli::import_file(
        &students,
        &schools,
        SchoolId::from(school_id),
        &content,
        ImportOptions { skip_invalid },
        &config,
    )
    .await?;

    let csv = export_credentials_to_csv(&report.credentials)?;
    std::fs::write(output, csv).with_context(|| format!("Failed to write {}", output.display()))?;

    println!("✅ Imported {} students", report.imported);
    if !report.skipped.is_empty() {
        println!("   Skipped {} invalid rows", report.skipped.len());
    }
    println!("   Credentials: {}", output.display());
    Ok(())
}

async fn handle_create_school(
    pool: &PgPool,
    name: Option<String>,
    code: Option<String>,
    address: Option<String>,
) -> anyhow::Result<()> {
    let name = match name {
        Some(name) => name,
        None => Input::new().with_prompt("School name").interact_text()?,
    };
    let code = match code {
        Some(code) => code,
        None => Input::new().with_prompt("School code").interact_text()?,
    };

    let school = cli::create_school(
        &PgSchoolStore::new(pool.clone()),
        CreateSchoolDto {
            name,
            code,
            address,
        },
    )
    .await?;

    println!("✅ School created");
    println!("   ID: {}", school.id);
    println!("   Code: {}", school.code);
    Ok(())
}
