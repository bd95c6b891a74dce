//! Bounded scanning of dynamically-rendered collections.
//!
//! Collections like the "My Groups" card list re-render between
//! interactions, losing index stability, so candidates are identified by a
//! trimmed text signature rather than position. The scanner enumerates the
//! collection in passes, skips signatures it has already evaluated, and
//! stops on the first of: a candidate acted on successfully, a pass that
//! surfaces zero new signatures (stagnation), or the pass bound.

use crate::driver::PageDriver;
use crate::locator::{InteractionTarget, Selector};
use crate::result::EnsayoResult;
use async_trait::async_trait;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Upper bound on scan passes; prevents runaway loops over collections
/// that never stabilize.
pub const DEFAULT_MAX_PASSES: usize = 15;

/// Eligibility and action hooks for one scan.
///
/// Disqualification is expected control flow: probes inside
/// implementations should absorb "not available" (see
/// [`Interactor::probe_visible`](crate::interaction::Interactor::probe_visible))
/// rather than letting timeouts propagate.
#[async_trait]
pub trait CandidateJudge: Send + Sync {
    /// Whether the candidate is ineligible for the operation — typically a
    /// short-circuit OR of disqualifying state checks against the rendered
    /// item (inactive, interest-only, paid, ...).
    async fn disqualify(
        &self,
        driver: &dyn PageDriver,
        candidate: &InteractionTarget,
        signature: &str,
    ) -> EnsayoResult<bool>;

    /// Act on an eligible candidate.
    ///
    /// `Ok(true)` ends the scan successfully. `Ok(false)` means the
    /// candidate did not pan out after opening it (e.g. the capability
    /// probe inside came back empty); the scanner re-enumerates, because
    /// acting usually navigated away and the collection re-rendered.
    async fn act(
        &self,
        driver: &dyn PageDriver,
        candidate: &InteractionTarget,
        signature: &str,
    ) -> EnsayoResult<bool>;
}

/// How a scan ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// A candidate was acted on successfully.
    Acted {
        /// Signature of the accepted candidate
        signature: String,
    },
    /// No eligible candidate was found before the scan terminated.
    Exhausted {
        /// Distinct signatures evaluated
        visited: usize,
        /// Passes performed
        passes: usize,
    },
}

impl ScanOutcome {
    /// Whether a candidate was acted on.
    #[must_use]
    pub const fn acted(&self) -> bool {
        matches!(self, Self::Acted { .. })
    }
}

/// Scans one rendered collection for a candidate eligible for an operation.
#[derive(Debug)]
pub struct CandidateScanner {
    container: Selector,
    max_passes: usize,
    visited: HashSet<String>,
}

impl CandidateScanner {
    /// Scanner over all items matching `container`.
    #[must_use]
    pub fn new(container: Selector) -> Self {
        Self {
            container,
            max_passes: DEFAULT_MAX_PASSES,
            visited: HashSet::new(),
        }
    }

    /// Override the pass bound.
    #[must_use]
    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes.max(1);
        self
    }

    /// Signatures evaluated so far.
    #[must_use]
    pub const fn visited(&self) -> &HashSet<String> {
        &self.visited
    }

    /// Run the scan to completion.
    ///
    /// Each pass enumerates the currently-rendered items in encounter
    /// order; a signature is never evaluated twice across the whole scan.
    pub async fn run(
        &mut self,
        driver: &dyn PageDriver,
        judge: &dyn CandidateJudge,
    ) -> EnsayoResult<ScanOutcome> {
        for pass in 1..=self.max_passes {
            let count = driver.count(&self.container).await?;
            debug!(pass, count, container = %self.container, "scanning candidates");

            let mut progressed = false;

            for i in 0..count {
                let candidate = InteractionTarget::new(self.container.clone()).nth(i);

                let probe = driver.probe(&candidate).await?;
                if !probe.visible {
                    continue;
                }

                let signature = driver.inner_text(&candidate).await?.trim().to_string();
                if signature.is_empty() || self.visited.contains(&signature) {
                    continue;
                }
                self.visited.insert(signature.clone());
                progressed = true;

                debug!(%signature, "evaluating candidate");
                if judge.disqualify(driver, &candidate, &signature).await? {
                    debug!(%signature, "candidate disqualified");
                    continue;
                }

                if judge.act(driver, &candidate, &signature).await? {
                    info!(%signature, "candidate accepted");
                    return Ok(ScanOutcome::Acted { signature });
                }

                // Acting navigated somewhere and came back empty-handed;
                // the collection has likely re-rendered, so restart the
                // enumeration rather than trusting stale indices.
                warn!(%signature, "candidate did not pan out; re-enumerating");
                break;
            }

            if !progressed {
                debug!(pass, "no new candidates surfaced; scan exhausted");
                return Ok(ScanOutcome::Exhausted {
                    visited: self.visited.len(),
                    passes: pass,
                });
            }
        }

        warn!(max_passes = self.max_passes, "scan hit the pass bound");
        Ok(ScanOutcome::Exhausted {
            visited: self.visited.len(),
            passes: self.max_passes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockElement, MockPage};
    use std::sync::Mutex;

    /// Judge that disqualifies by signature substring and records every
    /// evaluation; `act` accepts unless told to keep looking.
    struct ScriptedJudge {
        disqualify_containing: Vec<&'static str>,
        accept: bool,
        evaluated: Mutex<Vec<String>>,
        acted_on: Mutex<Vec<String>>,
    }

    impl ScriptedJudge {
        fn accepting(disqualify_containing: Vec<&'static str>) -> Self {
            Self {
                disqualify_containing,
                accept: true,
                evaluated: Mutex::new(Vec::new()),
                acted_on: Mutex::new(Vec::new()),
            }
        }

        fn rejecting() -> Self {
            Self {
                disqualify_containing: Vec::new(),
                accept: false,
                evaluated: Mutex::new(Vec::new()),
                acted_on: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CandidateJudge for ScriptedJudge {
        async fn disqualify(
            &self,
            _driver: &dyn PageDriver,
            _candidate: &InteractionTarget,
            signature: &str,
        ) -> EnsayoResult<bool> {
            self.evaluated.lock().unwrap().push(signature.to_string());
            Ok(self
                .disqualify_containing
                .iter()
                .any(|needle| signature.contains(needle)))
        }

        async fn act(
            &self,
            _driver: &dyn PageDriver,
            _candidate: &InteractionTarget,
            signature: &str,
        ) -> EnsayoResult<bool> {
            self.acted_on.lock().unwrap().push(signature.to_string());
            Ok(self.accept)
        }
    }

    fn cards() -> Selector {
        Selector::test_id("group-card")
    }

    fn page_with(texts: &[&str]) -> MockPage {
        let page = MockPage::new();
        page.insert_many(&cards(), texts.iter().map(|t| MockElement::new(*t)).collect());
        page
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_eligible_wins_and_scan_stops() {
        // item 2 is inactive; items 1 and 3 are eligible. The scan must
        // act on item 1 and never even visit item 3.
        let page = page_with(&[
            "Group One 5 Members",
            "Group Two Activate your group",
            "Group Three 2 Members",
        ]);
        let judge = ScriptedJudge::accepting(vec!["Activate your group"]);
        let mut scanner = CandidateScanner::new(cards());

        let outcome = scanner.run(&page, &judge).await.unwrap();
        assert_eq!(
            outcome,
            ScanOutcome::Acted {
                signature: "Group One 5 Members".to_string()
            }
        );
        assert!(!scanner.visited().contains("Group Three 2 Members"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_signature_evaluated_twice() {
        let page = page_with(&[
            "Group One 5 Members",
            "Group Two 3 Members",
            "Group Three 2 Members",
        ]);
        // every candidate opens but never supports the operation
        let judge = ScriptedJudge::rejecting();
        let mut scanner = CandidateScanner::new(cards());

        let outcome = scanner.run(&page, &judge).await.unwrap();
        assert!(!outcome.acted());

        let evaluated = judge.evaluated.lock().unwrap().clone();
        let mut unique = evaluated.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(evaluated.len(), unique.len(), "revisited: {evaluated:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_stagnation_ends_scan_after_one_extra_pass() {
        let page = page_with(&["Group One Activate your group", "Group Two I'm interested"]);
        let judge = ScriptedJudge::accepting(vec!["Activate your group", "I'm interested"]);
        let mut scanner = CandidateScanner::new(cards());

        match scanner.run(&page, &judge).await.unwrap() {
            ScanOutcome::Exhausted { visited, passes } => {
                assert_eq!(visited, 2);
                assert_eq!(passes, 2, "one productive pass + one stagnant pass");
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }
        assert!(judge.acted_on.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_collection_exhausts_immediately() {
        let page = MockPage::new();
        let judge = ScriptedJudge::accepting(vec![]);
        let mut scanner = CandidateScanner::new(cards());

        match scanner.run(&page, &judge).await.unwrap() {
            ScanOutcome::Exhausted { visited, passes } => {
                assert_eq!(visited, 0);
                assert_eq!(passes, 1);
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_invisible_candidates_are_skipped() {
        let page = MockPage::new();
        page.insert_many(
            &cards(),
            vec![
                MockElement::new("Hidden Group").hidden(),
                MockElement::new("Visible Group 4 Members"),
            ],
        );
        let judge = ScriptedJudge::accepting(vec![]);
        let mut scanner = CandidateScanner::new(cards());

        let outcome = scanner.run(&page, &judge).await.unwrap();
        assert_eq!(
            outcome,
            ScanOutcome::Acted {
                signature: "Visible Group 4 Members".to_string()
            }
        );
        assert!(!scanner.visited().contains("Hidden Group"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pass_bound_holds_when_collection_never_stabilizes() {
        use std::sync::Arc;

        /// Every `act` injects a brand-new card, so each pass surfaces a
        /// new signature and stagnation never triggers.
        struct ChurningJudge {
            page: Arc<MockPage>,
            injected: Mutex<usize>,
        }

        #[async_trait]
        impl CandidateJudge for ChurningJudge {
            async fn disqualify(
                &self,
                _driver: &dyn PageDriver,
                _candidate: &InteractionTarget,
                _signature: &str,
            ) -> EnsayoResult<bool> {
                Ok(false)
            }

            async fn act(
                &self,
                _driver: &dyn PageDriver,
                _candidate: &InteractionTarget,
                _signature: &str,
            ) -> EnsayoResult<bool> {
                let mut injected = self.injected.lock().unwrap();
                *injected += 1;
                self.page.insert(
                    &cards(),
                    MockElement::new(format!("Churned Group {injected}")),
                );
                Ok(false)
            }
        }

        let page = Arc::new(page_with(&["Group Zero 1 Member"]));
        let judge = ChurningJudge {
            page: page.clone(),
            injected: Mutex::new(0),
        };
        let mut scanner = CandidateScanner::new(cards()).with_max_passes(5);

        match scanner.run(page.as_ref(), &judge).await.unwrap() {
            ScanOutcome::Exhausted { passes, .. } => assert_eq!(passes, 5),
            other => panic!("expected pass-bound exhaustion, got {other:?}"),
        }
    }

    mod termination_properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            /// The scan terminates within the pass bound for any mix of
            /// card texts (duplicates, blanks, whitespace included), and
            /// never evaluates more distinct signatures than there are
            /// distinct non-blank texts.
            #[test]
            fn scan_always_terminates(texts in proptest::collection::vec("[ a-zA-Z0-9]{0,12}", 0..12)) {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_time()
                    .build()
                    .unwrap();
                runtime.block_on(async {
                    let page = MockPage::new();
                    page.insert_many(
                        &cards(),
                        texts.iter().map(|t| MockElement::new(t.as_str())).collect(),
                    );
                    let judge = ScriptedJudge::rejecting();
                    let mut scanner = CandidateScanner::new(cards()).with_max_passes(8);

                    let outcome = scanner.run(&page, &judge).await.unwrap();

                    let distinct: HashSet<String> = texts
                        .iter()
                        .map(|t| t.trim().to_string())
                        .filter(|t| !t.is_empty())
                        .collect();
                    prop_assert!(scanner.visited().len() <= distinct.len());
                    match outcome {
                        ScanOutcome::Exhausted { passes, .. } => prop_assert!(passes <= 8),
                        ScanOutcome::Acted { .. } => prop_assert!(false, "rejecting judge never accepts"),
                    }
                    Ok(())
                })?;
            }
        }
    }
}
