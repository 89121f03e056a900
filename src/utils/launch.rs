use futures::future::Future;
use tokio::runtime;

/// Run the future to completion on a single threaded runtime.
///
/// Requests are issued one after the other, so there is no point in a multi
/// threaded runtime.
pub fn launch_with_runtime<F>(run: F) -> Result<(), Box<dyn std::error::Error>>
where
    F: Future<Output = Result<(), Box<dyn std::error::Error>>>,
{
    let runtime = runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_forward_the_future_result() {
        assert!(launch_with_runtime(async { Ok(()) }).is_ok());

        let res = launch_with_runtime(async {
            Err(Box::<dyn std::error::Error>::from("failed on purpose"))
        });
        assert_eq!(res.unwrap_err().to_string(), "failed on purpose");
    }
}
