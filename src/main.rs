#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    isg_docs_server::run().await
}
