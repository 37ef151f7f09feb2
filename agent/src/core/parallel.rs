// Named branches run concurrently on the same input
use std::collections::BTreeMap;

use super::runnable::{Runnable, RunnableFuture};

pub type BranchResults<O> = BTreeMap<String, Result<O, anyhow::Error>>;

/// Fan-out over named branches with a join barrier.
///
/// Each branch receives a clone of the input. The combined future resolves
/// only after every branch resolved; a failing branch is reported in its own
/// slot and never cancels its siblings. Branch names are unique: adding a
/// name twice replaces the earlier branch.
pub struct RunnableParallel<I: Send + 'static, O: Send + 'static> {
    branches: Vec<(String, Box<dyn Runnable<I, O> + Send + Sync>)>,
}

impl<I: Clone + Send + 'static, O: Send + 'static> RunnableParallel<I, O> {
    pub fn new() -> Self {
        Self { branches: Vec::new() }
    }

    pub fn branch(mut self, name: impl Into<String>, runnable: impl Runnable<I, O> + Send + Sync + 'static) -> Self {
        let name = name.into();
        self.branches.retain(|(existing, _)| *existing != name);
        self.branches.push((name, Box::new(runnable)));
        self
    }

    pub fn branch_names(&self) -> Vec<&str> {
        self.branches.iter().map(|(name, _)| name.as_str()).collect()
    }
}

impl<I: Clone + Send + 'static, O: Send + 'static> Default for RunnableParallel<I, O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Clone + Send + 'static, O: Send + 'static> Runnable<I, BranchResults<O>> for RunnableParallel<I, O> {
    fn invoke(&self, input: I) -> RunnableFuture<BranchResults<O>> {
        let pending: Vec<_> = self
            .branches
            .iter()
            .map(|(name, runnable)| {
                let name = name.clone();
                let future = runnable.invoke(input.clone());
                async move { (name, future.await) }
            })
            .collect();

        Box::pin(async move {
            let results: BranchResults<O> = futures::future::join_all(pending).await.into_iter().collect();
            Ok(results)
        })
    }

    fn clone_to_owned(&self) -> Box<dyn Runnable<I, BranchResults<O>> + Send + Sync> {
        Box::new(RunnableParallel {
            branches: self
                .branches
                .iter()
                .map(|(name, runnable)| (name.clone(), runnable.clone_to_owned()))
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::Instant;

    #[derive(Clone)]
    struct Sleepy {
        millis: u64,
        fail: bool,
    }

    impl Runnable<String, String> for Sleepy {
        fn invoke(&self, input: String) -> RunnableFuture<String> {
            let this = self.clone();
            Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(this.millis)).await;
                if this.fail {
                    anyhow::bail!("branch failed for {}", input);
                }
                Ok(format!("{}:{}", input, this.millis))
            })
        }

        fn clone_to_owned(&self) -> Box<dyn Runnable<String, String> + Send + Sync> {
            Box::new(self.clone())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_branches_run_concurrently() {
        let parallel = RunnableParallel::new()
            .branch("a", Sleepy { millis: 150, fail: false })
            .branch("b", Sleepy { millis: 150, fail: false })
            .branch("c", Sleepy { millis: 150, fail: false });

        let started = Instant::now();
        let results = parallel.invoke("x".to_string()).await.unwrap();
        let elapsed = started.elapsed();

        assert_eq!(results.len(), 3);
        assert_eq!(results["a"].as_ref().unwrap(), "x:150");
        // paused clock: one shared 150ms wait, sequential execution would need 450ms
        assert!(elapsed >= Duration::from_millis(150));
        assert!(elapsed < Duration::from_millis(300), "took {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_failing_branch_does_not_abort_siblings() {
        let parallel = RunnableParallel::new()
            .branch("ok", Sleepy { millis: 10, fail: false })
            .branch("bad", Sleepy { millis: 1, fail: true });

        let results = parallel.invoke("x".to_string()).await.unwrap();
        assert_eq!(results["ok"].as_ref().unwrap(), "x:10");
        assert_eq!(results["bad"].as_ref().unwrap_err().to_string(), "branch failed for x");
    }

    #[test]
    fn test_duplicate_branch_replaces() {
        let parallel: RunnableParallel<String, String> = RunnableParallel::new()
            .branch("a", Sleepy { millis: 1, fail: false })
            .branch("b", Sleepy { millis: 1, fail: false })
            .branch("a", Sleepy { millis: 2, fail: true });
        assert_eq!(parallel.branch_names(), vec!["b", "a"]);
    }
}
