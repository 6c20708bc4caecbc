use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use onboarder::api::{
    CustomerRecord, HttpTransport, PostalAddress, VerificationMethod,
};
use onboarder::bus::NotificationBus;
use onboarder::config::Config;
use onboarder::logging::init_logging;
use onboarder::session::{FileBackend, SessionStore};
use onboarder::wizard::verification::VerificationStatus;
use onboarder::wizard::Wizard;
use onboarder::ProvisioningClient;

/// Headless driver for the provisioning wizard: walks a domain through
/// the full onboarding sequence against the configured endpoint.
#[derive(Parser, Debug)]
#[command(name = "onboarder", version, about)]
struct Cli {
    /// Domain to provision
    domain: String,

    /// Seats on the primary subscription (config default when omitted)
    #[arg(long)]
    seats: Option<u32>,

    /// Ownership proof method: FILE, META, ANALYTICS, TAG_MANAGER,
    /// DNS_TXT or DNS_CNAME
    #[arg(long, default_value = "DNS_TXT")]
    verification_method: String,

    /// Confirmation attempts before giving up (10s apart); the challenge
    /// token is printed before the first attempt
    #[arg(long, default_value_t = 1)]
    verification_attempts: u32,

    /// Skip the storage add-on and license steps
    #[arg(long)]
    skip_storage: bool,

    /// Alternate (non-provisioned) contact email for the customer record
    #[arg(long, default_value = "nobody@example.com")]
    alternate_email: String,

    /// Contact phone number
    #[arg(long, default_value = "212.555.0000")]
    phone_number: String,

    #[arg(long, default_value = "Admin Contact")]
    contact_name: String,

    #[arg(long, default_value = "Demo Company")]
    organization_name: String,

    #[arg(long, default_value = "76 9th Ave")]
    address_line1: String,

    #[arg(long, default_value = "NYC")]
    locality: String,

    #[arg(long, default_value = "NY")]
    region: String,

    #[arg(long, default_value = "US")]
    country_code: String,

    #[arg(long, default_value = "11101")]
    postal_code: String,

    /// Persist session state to this file instead of memory
    #[arg(long)]
    session_file: Option<PathBuf>,

    /// Path to a config file (layered over defaults and user config)
    #[arg(long)]
    config: Option<String>,

    /// Force debug-level logging
    #[arg(long)]
    debug: bool,
}

fn parse_method(raw: &str) -> Result<VerificationMethod> {
    let method = match raw.to_ascii_uppercase().as_str() {
        "FILE" => VerificationMethod::File,
        "META" => VerificationMethod::Meta,
        "ANALYTICS" => VerificationMethod::Analytics,
        "TAG_MANAGER" => VerificationMethod::TagManager,
        "DNS_TXT" => VerificationMethod::DnsTxt,
        "DNS_CNAME" => VerificationMethod::DnsCname,
        other => bail!("unknown verification method: {other}"),
    };
    Ok(method)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;
    let _logging = init_logging(&config, cli.debug)?;

    let run_id = uuid::Uuid::new_v4();
    tracing::info!(%run_id, domain = %cli.domain, "starting provisioning run");

    let method = parse_method(&cli.verification_method)?;
    let seats = cli.seats.unwrap_or(config.provisioning.default_seats);

    let bus = NotificationBus::new();
    let mut alerts = bus.subscribe_alerts();
    tokio::spawn(async move {
        while let Ok(alert) = alerts.recv().await {
            eprintln!("[{}] {}", alert.severity, alert.text);
        }
    });

    let transport = HttpTransport::new(config.api.base_url.clone(), config.api_token())
        .context("Failed to build API transport")?;
    let client = ProvisioningClient::new(Arc::new(transport), bus.clone());

    let session = match &cli.session_file {
        Some(path) => SessionStore::new(Box::new(
            FileBackend::open(path).context("Failed to open session file")?,
        )),
        None => SessionStore::in_memory(),
    };

    let mut wizard = Wizard::with_defaults(client, session, bus, config.wizard_defaults());

    let record = CustomerRecord {
        domain: cli.domain.clone(),
        alternate_email: cli.alternate_email.clone(),
        phone_number: cli.phone_number.clone(),
        postal_address: PostalAddress {
            contact_name: cli.contact_name.clone(),
            organization_name: cli.organization_name.clone(),
            locality: cli.locality.clone(),
            region: cli.region.clone(),
            country_code: cli.country_code.clone(),
            postal_code: cli.postal_code.clone(),
            address_line1: cli.address_line1.clone(),
            address_line2: None,
        },
    };

    wizard
        .submit_customer(record)
        .await
        .context("Customer creation failed")?;
    println!("Customer record created for {}", cli.domain);

    wizard
        .submit_subscription(seats)
        .await
        .context("Subscription creation failed")?;
    println!("Primary subscription attached ({seats} seats)");

    let challenge = wizard
        .submit_verification_request(method)
        .await
        .context("Verification challenge request failed")?;
    println!(
        "Place this verification token for {} ({}):\n  {}",
        challenge.verification_identifier,
        cli.verification_method.to_ascii_uppercase(),
        challenge.verification_token
    );

    wizard.confirm_challenge_reviewed()?;

    let mut verified = false;
    for attempt in 1..=cli.verification_attempts.max(1) {
        match wizard.run_verification().await? {
            VerificationStatus::Ok => {
                verified = true;
                break;
            }
            status => {
                tracing::warn!(attempt, ?status, "domain verification not confirmed yet");
                if attempt < cli.verification_attempts {
                    tokio::time::sleep(Duration::from_secs(10)).await;
                }
            }
        }
    }
    if !verified {
        bail!(
            "domain ownership not confirmed; place the token above and run again \
             (already-created resources are reported as existing)"
        );
    }
    println!("Domain ownership verified");

    wizard.begin_user_create()?;
    let account = wizard
        .create_admin_account()
        .await
        .context("Admin account creation failed")?;
    println!(
        "Administrator created: {} (one-time password: {})",
        account.username, account.password
    );

    if cli.skip_storage {
        tracing::info!("storage add-on skipped");
    } else {
        wizard
            .submit_storage_subscription()
            .await
            .context("Storage subscription failed")?;
        println!("Storage add-on subscription attached");

        let assignment = wizard
            .submit_storage_license()
            .await
            .context("Storage license assignment failed")?;
        println!(
            "Storage license {} assigned to {}",
            assignment.sku_id, assignment.user_id
        );
    }

    tracing::info!(step = ?wizard.current_step(), "provisioning run finished");
    Ok(())
}
