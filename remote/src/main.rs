mod cli;
mod client;
#[cfg(test)]
mod fake_device;
mod host;
mod session;
mod settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    host::run().await
}
