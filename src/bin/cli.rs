//! Claimsight CLI
//!
//! Command-line interface to the claims analytics backend:
//! - Sign in and out (demo accounts work offline)
//! - View statistics, claim analysis and model status
//! - Estimate a claim and email the report
//! - Upload datasets and retrain the model (admin)

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use claimsight::api::{
    ClaimsAnalysis, DashboardStats, DatasetFile, Gender, ModelInfo, PatientProfile,
    PredictionEmailRequest, PredictionResult, Region, Smoker,
};
use claimsight::{ApiError, CancelToken, ClaimsApi, Config, LoggingConfig, Navigator, Outcome, Route};

#[derive(Parser)]
#[command(name = "claimsight")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Client for the medical insurance claims analytics service")]
#[command(long_about = "Claimsight talks to the claims analytics backend.\nWhen the backend is unreachable it falls back to clearly marked offline results.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Backend URL (overrides config and CLAIMSIGHT_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Config file (default: platform config dir, then ./claimsight.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(clap::Args)]
pub struct ProfileArgs {
    /// Age in years (18-100)
    #[arg(long)]
    age: u32,
    /// Body mass index (10-50)
    #[arg(long)]
    bmi: f64,
    /// Male or Female
    #[arg(long, value_parser = parse_gender)]
    gender: Gender,
    /// Smoker (yes/no)
    #[arg(long, value_parser = parse_smoker, default_value = "no")]
    smoker: Smoker,
    /// Region (North, South, East, West)
    #[arg(long, value_parser = parse_region)]
    region: Region,
    /// Annual premium in INR
    #[arg(long)]
    premium: Option<f64>,
}

impl ProfileArgs {
    fn profile(&self) -> PatientProfile {
        PatientProfile {
            age: self.age,
            bmi: self.bmi,
            gender: self.gender,
            smoker: self.smoker,
            region: self.region.clone(),
            premium_annual_inr: self.premium,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },

    /// Create an account
    Signup {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },

    /// Sign out and remove the stored session
    Logout,

    /// Show the current session
    Whoami {
        /// Also ask the backend
        #[arg(long)]
        remote: bool,
    },

    /// Portfolio statistics
    Stats,

    /// Claim analysis by age, region and smoking status
    Analysis,

    /// Prediction model status
    ModelInfo,

    /// Estimate a claim amount
    Predict {
        #[command(flatten)]
        profile: ProfileArgs,
    },

    /// Estimate a claim and email the report
    Email {
        /// Recipient address
        #[arg(long)]
        to: String,
        /// Patient name shown in the report
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        profile: ProfileArgs,
    },

    /// Upload a training dataset (admin)
    Upload {
        /// Path to CSV file (max 10 MB)
        path: PathBuf,
    },

    /// Retrain the prediction model (admin)
    Retrain,

    /// Check backend health
    Health,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Commands {
    fn start_route(&self) -> Route {
        match self {
            Commands::Login { .. } => Route::Login,
            Commands::Signup { .. } => Route::Signup,
            Commands::Predict { .. } | Commands::Email { .. } => Route::Predict,
            Commands::Analysis => Route::Analysis,
            Commands::Upload { .. } | Commands::Retrain => Route::Admin,
            _ => Route::Dashboard,
        }
    }
}

fn parse_gender(s: &str) -> Result<Gender, String> {
    match s.to_lowercase().as_str() {
        "male" | "m" => Ok(Gender::Male),
        "female" | "f" => Ok(Gender::Female),
        other => Err(format!("unknown gender '{}', use Male or Female", other)),
    }
}

fn parse_smoker(s: &str) -> Result<Smoker, String> {
    match s.to_lowercase().as_str() {
        "yes" | "y" | "true" => Ok(Smoker::Yes),
        "no" | "n" | "false" => Ok(Smoker::No),
        other => Err(format!("unknown smoker value '{}', use yes or no", other)),
    }
}

fn parse_region(s: &str) -> Result<Region, String> {
    Ok(match s.to_lowercase().as_str() {
        "north" => Region::North,
        "south" => Region::South,
        "east" => Region::East,
        "west" => Region::West,
        _ => Region::Other(s.to_string()),
    })
}

fn init_logging(config: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("claimsight={}", config.level).into());
    let json = config.format == "json";

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();
}

fn load_config(cli: &Cli) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }
    Ok(config)
}

fn fail(err: &ApiError, format: &str) -> ! {
    if format == "json" {
        match serde_json::to_string_pretty(&err.to_body()) {
            Ok(body) => eprintln!("{}", body),
            Err(_) => eprintln!("{}", err),
        }
    } else {
        eprintln!("Error: {}", err);
    }
    std::process::exit(1);
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn sample_banner(is_mock: bool) {
    if is_mock {
        println!("(sample data - backend unavailable)");
        println!();
    }
}

fn inr(amount: f64) -> String {
    let whole = amount.round() as i64;
    let digits = whole.abs().to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if whole < 0 {
        format!("-INR {}", grouped)
    } else {
        format!("INR {}", grouped)
    }
}

fn print_stats(outcome: &Outcome<DashboardStats>) {
    let stats = &outcome.data;
    sample_banner(outcome.is_mock);
    println!("Total policies:   {}", stats.total_policies);
    println!("Average claim:    {}", inr(stats.avg_claim));
    println!("Average premium:  {}", inr(stats.avg_premium));
    if stats.avg_premium > 0.0 {
        println!("Claim ratio:      {:.1}%", stats.avg_claim / stats.avg_premium * 100.0);
    }
    println!("Average age:      {:.1}", stats.avg_age);
    println!("Average BMI:      {:.1}", stats.avg_bmi);
    println!("Smokers:          {:.1}%", stats.smoker_percentage);

    println!();
    println!("{:<12} {:>8} {:>8}", "Region", "Policies", "Share");
    println!("{}", "-".repeat(30));
    for (region, count) in &stats.regions {
        let share = if stats.total_policies > 0 {
            *count as f64 / stats.total_policies as f64 * 100.0
        } else {
            0.0
        };
        println!("{:<12} {:>8} {:>7.1}%", region, count, share);
    }
}

fn print_group(title: &str, claims: &std::collections::BTreeMap<String, f64>, premiums: &std::collections::BTreeMap<String, f64>) {
    println!("{:<12} {:>14} {:>14}", title, "Avg claim", "Avg premium");
    println!("{}", "-".repeat(42));
    for (group, claim) in claims {
        let premium = premiums.get(group).copied().unwrap_or(0.0);
        println!("{:<12} {:>14} {:>14}", group, inr(*claim), inr(premium));
    }
    println!();
}

fn print_analysis(outcome: &Outcome<ClaimsAnalysis>) {
    let analysis = &outcome.data;
    sample_banner(outcome.is_mock);
    print_group(
        "Age group",
        &analysis.age_groups.claim_amount_inr,
        &analysis.age_groups.premium_annual_inr,
    );
    print_group(
        "Region",
        &analysis.region_analysis.claim_amount_inr.mean,
        &analysis.region_analysis.premium_annual_inr,
    );
    print_group(
        "Smoker",
        &analysis.smoker_analysis.claim_amount_inr,
        &analysis.smoker_analysis.premium_annual_inr,
    );

    println!("{:<12} {:>14}", "Premium band", "Avg claim");
    println!("{}", "-".repeat(27));
    for (band, claim) in &analysis.premium_vs_claims {
        println!("{:<12} {:>14}", band, inr(*claim));
    }
}

fn print_model_info(outcome: &Outcome<ModelInfo>) {
    let info = &outcome.data;
    sample_banner(outcome.is_mock);
    println!("Status:           {}", info.status);
    if let Some(model_type) = &info.model_type {
        println!("Model:            {}", model_type);
    }
    if let Some(r2) = info.test_r2 {
        println!("Test R²:          {:.3}", r2);
    }
    if let Some(rmse) = info.test_rmse {
        println!("Test RMSE:        {}", inr(rmse));
    }
    if let Some(samples) = info.training_samples {
        println!("Training samples: {}", samples);
    }
    if let Some(date) = &info.training_date {
        println!("Trained on:       {}", date);
    }
}

fn print_prediction(outcome: &Outcome<PredictionResult>) {
    let result = &outcome.data;
    if outcome.is_mock {
        println!("(offline estimate - prediction service unavailable)");
        println!();
    }
    println!("Estimated claim:  {}", inr(result.prediction));
    println!("Confidence:       {:.0}%", result.confidence * 100.0);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Commands::Config { output } = &cli.command {
        let config = claimsight::config::generate_default_config();
        match output {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(path, &config)?;
                println!("Config written to {:?}", path);
            }
            None => print!("{}", config),
        }
        return Ok(());
    }

    let config = load_config(&cli)?;
    init_logging(&config.logging);

    let start = cli.command.start_route();
    let api = match ClaimsApi::from_config(&config, start.clone()) {
        Ok(api) => api,
        Err(e) => fail(&e, &cli.format),
    };

    let cancel = CancelToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, cancelling");
            on_interrupt.cancel();
        }
    });

    let json = cli.format == "json";

    match &cli.command {
        Commands::Login { email, password } => match api.login(email, password).await {
            Ok(login) => {
                if json {
                    print_json(&api.auth_status())?;
                } else {
                    let demo = if api.store().snapshot().is_demo() { " (demo account)" } else { "" };
                    println!(
                        "Signed in as {}{}",
                        login.email.as_deref().unwrap_or(email),
                        demo
                    );
                    if login.is_admin {
                        println!("Admin access enabled");
                    }
                    if api.store().mark_onboarding_seen() {
                        println!();
                        println!("Get started:");
                        println!("  claimsight stats");
                        println!("  claimsight predict --age 40 --bmi 27 --gender female --region south");
                    }
                }
            }
            Err(e) => fail(&e, &cli.format),
        },

        Commands::Signup { email, password } => match api.signup(email, password).await {
            Ok(account) => {
                if json {
                    print_json(&account)?;
                } else {
                    println!("Account created for {}", account.email);
                    println!("Sign in with: claimsight login --email {} --password ...", account.email);
                }
            }
            Err(e) => fail(&e, &cli.format),
        },

        Commands::Logout => {
            if let Err(e) = api.logout() {
                fail(&e, &cli.format);
            }
            println!("Signed out");
        }

        Commands::Whoami { remote } => {
            let status = api.auth_status();
            if json && !remote {
                print_json(&status)?;
            } else if !status.has_token {
                println!("Not signed in");
            } else {
                println!("Email:   {}", status.user_email.as_deref().unwrap_or("-"));
                println!("Admin:   {}", status.is_admin);
                println!("Origin:  {:?}", status.origin);
                println!("Token:   {}", status.token_preview.as_deref().unwrap_or("-"));
            }
            if *remote && status.has_token {
                match api.current_user(&cancel).await {
                    Ok(user) if json => print_json(&user)?,
                    Ok(user) => println!("Backend: {} (admin: {})", user.email, user.is_admin),
                    Err(e) => fail(&e, &cli.format),
                }
            }
        }

        Commands::Stats => match api.stats(&cancel).await {
            Ok(outcome) if json => print_json(&outcome)?,
            Ok(outcome) => print_stats(&outcome),
            Err(e) => fail(&e, &cli.format),
        },

        Commands::Analysis => match api.claims_analysis(&cancel).await {
            Ok(outcome) if json => print_json(&outcome)?,
            Ok(outcome) => print_analysis(&outcome),
            Err(e) => fail(&e, &cli.format),
        },

        Commands::ModelInfo => match api.model_info(&cancel).await {
            Ok(outcome) if json => print_json(&outcome)?,
            Ok(outcome) => print_model_info(&outcome),
            Err(e) => fail(&e, &cli.format),
        },

        Commands::Predict { profile } => match api.predict(&profile.profile(), &cancel).await {
            Ok(outcome) if json => print_json(&outcome)?,
            Ok(outcome) => print_prediction(&outcome),
            Err(e) => fail(&e, &cli.format),
        },

        Commands::Email { to, name, profile } => {
            let prediction = match api.predict(&profile.profile(), &cancel).await {
                Ok(outcome) => outcome.data,
                Err(e) => fail(&e, &cli.format),
            };
            let request = PredictionEmailRequest {
                email: to.clone(),
                prediction,
                patient_name: name.clone(),
            };
            match api.send_prediction_email(&request, &cancel).await {
                Ok(result) if json => print_json(&result)?,
                Ok(result) => {
                    println!("{}", result.message);
                    if !result.success {
                        std::process::exit(1);
                    }
                }
                Err(e) => fail(&e, &cli.format),
            }
        }

        Commands::Upload { path } => {
            if !path.exists() {
                eprintln!("File not found: {:?}", path);
                std::process::exit(1);
            }
            let file = DatasetFile::from_path(path)?;
            match api.upload_dataset(&file, &cancel).await {
                Ok(outcome) if json => print_json(&outcome)?,
                Ok(outcome) => {
                    println!("{}", outcome.data.message);
                    if let Some(rows) = outcome.data.dataset_rows {
                        println!("Rows: {}", rows);
                    }
                }
                Err(e) => fail(&e, &cli.format),
            }
        }

        Commands::Retrain => match api.retrain_model(&cancel).await {
            Ok(outcome) if json => print_json(&outcome)?,
            Ok(outcome) => {
                println!("{}", outcome.data.message);
                if let Some(accuracy) = outcome.data.new_accuracy {
                    println!("Accuracy: {:.1}%", accuracy * 100.0);
                }
                if let Some(time) = &outcome.data.training_time {
                    println!("Training time: {}", time);
                }
            }
            Err(e) => fail(&e, &cli.format),
        },

        Commands::Health => {
            if api.health().await {
                println!("Backend at {} is up", config.api.base_url());
            } else {
                eprintln!("Cannot reach backend at {}", config.api.base_url());
                std::process::exit(1);
            }
        }

        Commands::Config { .. } => {}
    }

    if api.navigator().current_route() == Route::Login && start != Route::Login {
        eprintln!();
        eprintln!("Your session has expired. Sign in again with:");
        eprintln!("  claimsight login --email <email> --password <password>");
    }

    Ok(())
}
