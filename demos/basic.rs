use engine_client::{Client, Endpoint};

#[tokio::main(flavor = "current_thread")]
async fn main() -> engine_client::Result<()> {
    // Adjust to your environment, e.g. `tcp://127.0.0.1:2375`.
    let endpoint: Endpoint = std::env::var("ENGINE_HOST")
        .map_or_else(|_| Ok(Endpoint::default()), |host| host.parse())?;

    let client = Client::connect(endpoint).await?;
    println!("ping = {}", client.ping().await?);

    let version = client.version(true).await?;
    println!("engine {} (API {})", version.version, version.api_version);

    for image in client.images(Default::default()).await? {
        println!("{} {:?}", image.id, image.repo_tags.unwrap_or_default());
    }

    Ok(())
}
