// Runnable interface definition - core concept of the framework
use std::future::Future;
use std::pin::Pin;

pub type RunnableFuture<O> = Pin<Box<dyn Future<Output = Result<O, anyhow::Error>> + Send>>;

// Runnable interface definition
pub trait Runnable<I: Send + 'static, O: Send + 'static>: Send + Sync {
    // Core async call method (main entry point)
    fn invoke(&self, input: I) -> RunnableFuture<O>;

    // Async batch processing for multiple inputs, all inputs run concurrently
    fn batch(&self, inputs: Vec<I>) -> Pin<Box<dyn Future<Output = Vec<Result<O, anyhow::Error>>> + Send>> {
        let self_clone = self.clone_to_owned();
        Box::pin(async move {
            futures::future::join_all(inputs.into_iter().map(|input| self_clone.invoke(input))).await
        })
    }

    // Owned copy that can be moved into a spawned future
    fn clone_to_owned(&self) -> Box<dyn Runnable<I, O> + Send + Sync>;
}

// Utility function: create a pipeline connecting two Runnables
pub fn pipe<I: Send + 'static, O1: Send + 'static, O2: Send + 'static>(
    first: impl Runnable<I, O1> + Send + Sync + 'static,
    second: impl Runnable<O1, O2> + Send + Sync + 'static,
) -> Box<dyn Runnable<I, O2> + Send + Sync> {
    // Wrap two components and execute them in sequence
    struct PipeImpl<I: Send + 'static, O1: Send + 'static, O2: Send + 'static> {
        first: Box<dyn Runnable<I, O1> + Send + Sync>,
        second: Box<dyn Runnable<O1, O2> + Send + Sync>,
    }

    impl<I: Send + 'static, O1: Send + 'static, O2: Send + 'static> Runnable<I, O2> for PipeImpl<I, O1, O2> {
        fn invoke(&self, input: I) -> RunnableFuture<O2> {
            let first_clone = self.first.clone_to_owned();
            let second_clone = self.second.clone_to_owned();

            Box::pin(async move {
                let intermediate = first_clone.invoke(input).await?;
                second_clone.invoke(intermediate).await
            })
        }

        fn clone_to_owned(&self) -> Box<dyn Runnable<I, O2> + Send + Sync> {
            Box::new(PipeImpl {
                first: self.first.clone_to_owned(),
                second: self.second.clone_to_owned(),
            })
        }
    }

    Box::new(PipeImpl {
        first: Box::new(first),
        second: Box::new(second),
    })
}

impl<I: Send + 'static, O: Send + 'static> Runnable<I, O> for Box<dyn Runnable<I, O> + Send + Sync> {
    fn invoke(&self, input: I) -> RunnableFuture<O> {
        (**self).invoke(input)
    }

    fn clone_to_owned(&self) -> Box<dyn Runnable<I, O> + Send + Sync> {
        (**self).clone_to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct AddOne;

    impl Runnable<i32, i32> for AddOne {
        fn invoke(&self, input: i32) -> RunnableFuture<i32> {
            Box::pin(async move { Ok(input + 1) })
        }

        fn clone_to_owned(&self) -> Box<dyn Runnable<i32, i32> + Send + Sync> {
            Box::new(self.clone())
        }
    }

    #[derive(Clone)]
    struct RejectNegative;

    impl Runnable<i32, String> for RejectNegative {
        fn invoke(&self, input: i32) -> RunnableFuture<String> {
            Box::pin(async move {
                if input < 0 {
                    Err(anyhow::anyhow!("negative input: {}", input))
                } else {
                    Ok(input.to_string())
                }
            })
        }

        fn clone_to_owned(&self) -> Box<dyn Runnable<i32, String> + Send + Sync> {
            Box::new(self.clone())
        }
    }

    #[tokio::test]
    async fn test_pipe_runs_in_sequence() {
        let chain = pipe(pipe(AddOne, AddOne), RejectNegative);
        assert_eq!(chain.invoke(1).await.unwrap(), "3");
    }

    #[tokio::test]
    async fn test_pipe_short_circuits_on_error() {
        let chain = pipe(AddOne, RejectNegative);
        let err = chain.invoke(-5).await.unwrap_err();
        assert_eq!(err.to_string(), "negative input: -4");
    }

    #[tokio::test]
    async fn test_batch_keeps_input_order() {
        let results = RejectNegative.batch(vec![3, -1, 7]).await;
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap(), "3");
        assert!(results[1].is_err());
        assert_eq!(results[2].as_ref().unwrap(), "7");
    }
}
