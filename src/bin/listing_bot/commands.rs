//! One-shot commands printing their answer to stdout.

use std::sync::Arc;

use market_watch::{
    provider::{coinbase::CoinbaseRates, imx::ImxClient},
    query::MarketQuery,
    render::RenderedResult,
};
use tracing::info;

use crate::{
    config::{AssetArgs, EnvConfig, MarketArgs},
    error::Result,
};

type LiveQuery = MarketQuery<ImxClient, ImxClient, CoinbaseRates>;

fn market_query(env: &EnvConfig, client: reqwest::Client) -> Result<LiveQuery> {
    let imx = Arc::new(ImxClient::new(client.clone(), env.imx_api_url()?));
    let rates = Arc::new(CoinbaseRates::new(client, env.coinbase_api_url()?));
    Ok(MarketQuery::new(Arc::clone(&imx), imx, rates))
}

/// Query listings and print them in the requested format.
pub async fn market(env: &EnvConfig, client: reqwest::Client, args: &MarketArgs) -> Result<()> {
    let config = args.to_query_config()?;
    let query = market_query(env, client)?;

    let result = query.run(&config, args.format(), args.currency()).await?;
    info!(records = result.records().len(), "Market query answered");

    println!("{}", result.content());
    if let RenderedResult::Detailed { records, .. } = &result {
        for record in records {
            println!("{}", serde_json::to_string_pretty(record)?);
        }
    }
    Ok(())
}

/// Print the spot rates table.
pub async fn rates(env: &EnvConfig, client: reqwest::Client) -> Result<()> {
    let query = market_query(env, client)?;
    for line in query.rates().await {
        println!("{line}");
    }
    Ok(())
}

/// Print a single hero or portal.
pub async fn asset(env: &EnvConfig, client: reqwest::Client, args: &AssetArgs) -> Result<()> {
    let collection = args.collection()?;
    let token_id = args.token_id()?;
    let query = market_query(env, client)?;

    let card = query.asset(collection, token_id).await?;
    println!("{card}");
    if let Some(image_url) = &card.image_url {
        println!("Image: {image_url}");
    }
    Ok(())
}
