use itertools::Itertools;
use metadesc::builder::BuildSession;
use metadesc::config::EngineConfig;
use metadesc::model::MemberInfo;
use metadesc::seed;

fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    use env_logger::Builder;
    use log::LevelFilter;

    Builder::new().filter_level(LevelFilter::Info).init();

    println!("metadesc: metadata-description engine demo");

    let config = EngineConfig::load()?;
    println!(
        "Configuration loaded: operation pattern '{}'",
        config.operation_pattern()
    );

    let mut session = BuildSession::with_config(config)?;
    let (catalog, model) = seed::seed_catalog(&mut session)?;
    println!(
        "Built {} entities: {}",
        catalog.len(),
        catalog.names().iter().join(", ")
    );

    for entity in [&model.customer, &model.product, &model.order] {
        println!("  {}  {}", entity.fingerprint, entity.name);
    }

    for qualifier in [seed::QUALIFIER_SUMMARY, seed::QUALIFIER_ADMIN] {
        let view = model.customer.reference(qualifier);
        println!(
            "Customer members under '{}': {}",
            qualifier,
            view.ordered_members()
                .iter()
                .map(|member| member.name().to_string())
                .join(", ")
        );
    }

    println!("{}", serde_json::to_string_pretty(model.order.as_ref())?);
    Ok(())
}
