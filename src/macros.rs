/// Macro to simplify creating a closure accepted by [`FnTask::new`](crate::FnTask::new).
///
/// Takes an optional synchronous setup block and a mandatory async logic block.
/// The setup block runs on every execution before the future is created, which
/// is where `Arc`s get cloned. The logic block must evaluate to a
/// [`TaskResult`](crate::TaskResult).
///
/// # Usage
///
/// ```ignore
/// # use pacekeeper::{task_fn, FnTask};
/// # use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
/// # let counter = Arc::new(AtomicUsize::new(0));
/// // With setup block:
/// let scan = FnTask::new(1, "scan", task_fn! {
///     {
///         let scans = counter.clone();
///     }
///     {
///         scans.fetch_add(1, Ordering::SeqCst);
///         Ok(())
///     }
/// });
///
/// // Without setup block:
/// let noop = FnTask::new(2, "noop", task_fn! {
///     {
///         tokio::time::sleep(std::time::Duration::from_millis(5)).await;
///         Ok(())
///     }
/// });
/// ```
#[macro_export]
macro_rules! task_fn {
    (
        { $($setup_stmts:stmt);* $(;)? }
        $main_block:block
    ) => {
        move || {
            $($setup_stmts;)*

            let fut = async move {
                let result: $crate::TaskResult = $main_block;
                result
            };

            Box::pin(fut) as std::pin::Pin<Box<dyn std::future::Future<Output = $crate::TaskResult> + Send + 'static>>
        }
    };

    (
        $main_block:block
    ) => {
         move || {
            let fut = async move {
                let result: $crate::TaskResult = $main_block;
                result
            };

            Box::pin(fut) as std::pin::Pin<Box<dyn std::future::Future<Output = $crate::TaskResult> + Send + 'static>>
        }
    };
}
