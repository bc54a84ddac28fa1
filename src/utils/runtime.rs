use anyhow::Result;

/// Everything in waterminder runs on one thread: user actions and the reminder tick never race.
pub fn single_thread_runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
