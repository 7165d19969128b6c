use crate::context::Context;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::connect().await?;
    let session = ctx.loaded_session().await?;
    let achievements = session.achievements().ok_or("no profile found")?;
    println!("{}", serde_json::to_string_pretty(&achievements)?);
    Ok(())
}
