use anyhow::{Context, Result};
use ap2_audit::AuditRecord;
use ap2_config::{load_demo_config, report_unused_keys, DemoConfig, LoadedConfig, UnusedKeyPolicy};
use ap2_mandate::paper_workflow;
use ap2_schemas::{amount_to_micros, format_amount, Product};
use ap2_session::{load_catalog, OrderSession};
use tracing::warn;

pub struct DemoArgs {
    pub config_paths: Vec<String>,
    pub product: Option<String>,
    pub audit_out: Option<String>,
    pub strict_config: bool,
}

fn load_config(config_paths: &[String], strict: bool) -> Result<(LoadedConfig, DemoConfig)> {
    let refs: Vec<&str> = config_paths.iter().map(|s| s.as_str()).collect();
    let (loaded, cfg) = load_demo_config(&refs)?;

    let policy = if strict {
        UnusedKeyPolicy::Fail
    } else {
        UnusedKeyPolicy::Warn
    };
    let report = report_unused_keys(&loaded.config_json, policy)?;
    for pointer in &report.unused_leaf_pointers {
        warn!(pointer = %pointer, "config key is not read by anything");
    }
    Ok((loaded, cfg))
}

/// Walk one session from landing to confirmation and print what happened.
///
/// The audit trail is printed (and exported, if asked) whether or not the
/// purchase succeeds.
pub fn run_demo(args: DemoArgs) -> Result<()> {
    let (loaded, cfg) = load_config(&args.config_paths, args.strict_config)?;
    println!("config_hash={}", loaded.config_hash);

    let catalog = load_catalog(&cfg.catalog.path)?;
    let workflow = paper_workflow(&cfg)?;
    let mut session = OrderSession::new(cfg.audit.hash_chain);

    session.search(&catalog, cfg.catalog.shortlist_size)?;
    for m in session.messages() {
        println!("assistant: {}", m.text);
    }
    for p in session.shortlist() {
        println!("shortlisted={} {}", p.id, price_label(p));
    }

    let product_id = match args.product {
        Some(id) => id,
        None => session
            .shortlist()
            .first()
            .map(|p| p.id.clone())
            .context("catalog is empty: nothing to order")?,
    };
    session.select(&product_id)?;
    if let Some(p) = session.current_product() {
        println!("selected={} title={:?} price={}", p.id, p.title, price_label(p));
    }
    println!("ship_to={:?}", cfg.shopper.shipping_address);

    let outcome = session
        .confirm(&workflow, &cfg.shopper, &cfg.merchant.id)
        .cloned();

    if let Some(m) = session.mandate() {
        println!("mandate_id={}", m.id());
    }
    print_audit(&session)?;
    if let Some(path) = &args.audit_out {
        session.audit_log().export_jsonl(path)?;
        println!("audit_out={path}");
    }

    let payment = outcome?;
    println!(
        "transaction_id={} status={} rail={} settlement_time={}",
        payment.transaction_id,
        payment.status,
        payment.rail,
        payment.settlement_time.to_rfc3339()
    );
    println!("page={}", session.page());
    Ok(())
}

fn print_audit(session: &OrderSession) -> Result<()> {
    for entry in session.audit_log().entries() {
        let json = serde_json::to_string(&entry.record).context("serialize audit record")?;
        println!("audit[{}] {} {}", entry.seq, entry.record.event(), json);
        if let AuditRecord::RiskCheck { risk_score, .. } = &entry.record {
            println!("risk_score={risk_score}");
        }
    }
    Ok(())
}

pub fn list_catalog(config_paths: &[String]) -> Result<()> {
    let (_loaded, cfg) = load_config(config_paths, false)?;
    let catalog = load_catalog(&cfg.catalog.path)?;
    for p in &catalog {
        println!("{}\t{}\t{}", p.id, p.title, price_label(p));
    }
    println!("products={}", catalog.len());
    Ok(())
}

fn price_label(p: &Product) -> String {
    match amount_to_micros(p.price) {
        Ok(micros) => format_amount(micros, &p.currency),
        Err(e) => format!("{} <{e}>", p.currency),
    }
}
