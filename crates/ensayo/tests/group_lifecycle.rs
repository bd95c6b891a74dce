//! The group lifecycle, end to end over the scripted driver: create a
//! group in one stage, then schedule a session from a later stage that
//! only knows the group by the name retrieved from the store.

use async_trait::async_trait;
use ensayo::mock::{MockElement, MockPage};
use ensayo::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn store_path(dir: &TempDir) -> PathBuf {
    dir.path().join("storage/runtime.json")
}

struct CreateGroupPage;

impl CreateGroupPage {
    fn name_input() -> InteractionTarget {
        InteractionTarget::new(Selector::css("input[name='groupName']"))
            .described("group name input")
    }

    fn description_input() -> InteractionTarget {
        InteractionTarget::new(Selector::css("textarea[name='description']"))
            .described("group description input")
    }

    fn submit_button() -> InteractionTarget {
        InteractionTarget::new(Selector::role("button", "Create Group"))
            .described("create group submit")
    }

    fn success_toast() -> InteractionTarget {
        InteractionTarget::new(Selector::text("Group created successfully!"))
            .described("group creation toast")
    }
}

impl PageContract for CreateGroupPage {
    fn url_pattern(&self) -> &str {
        "/groups/new"
    }

    fn ready_marker(&self) -> InteractionTarget {
        Self::name_input()
    }

    fn ready_timeout_ms(&self) -> u64 {
        2_000
    }
}

/// Scripted page for the create-group screen.
fn create_group_page() -> MockPage {
    let page = MockPage::new();
    page.insert(CreateGroupPage::name_input().selector(), MockElement::new(""));
    page.insert(
        CreateGroupPage::description_input().selector(),
        MockElement::new(""),
    );
    page.insert(
        CreateGroupPage::submit_button().selector(),
        MockElement::new("Create Group"),
    );
    // the toast flashes briefly after submit
    page.insert(
        CreateGroupPage::success_toast().selector(),
        MockElement::new("Group created successfully!").appearing_in(Duration::from_secs(86_400)),
    );
    page.on_click_reveal(
        CreateGroupPage::submit_button().selector(),
        CreateGroupPage::success_toast().selector(),
        Duration::from_millis(100),
        Some(Duration::from_millis(400)),
    );
    page
}

#[tokio::test(start_paused = true)]
async fn create_group_stage_persists_the_group_name() {
    let dir = TempDir::new().unwrap();
    let page = Arc::new(create_group_page());
    let base = BasePage::new(page.clone());
    let store = FileStore::new(store_path(&dir));

    let group_name = data::group_name();

    base.goto("https://app.example.test/groups/new").await.unwrap();
    base.wait_until_ready(&CreateGroupPage).await.unwrap();

    base.stable_fill(&CreateGroupPage::name_input(), &group_name)
        .await
        .unwrap();
    base.stable_fill(
        &CreateGroupPage::description_input(),
        &data::description("Created by the automated lifecycle run"),
    )
    .await
    .unwrap();

    base.click_and_wait_for_success(
        &CreateGroupPage::submit_button(),
        &CreateGroupPage::success_toast(),
        Duration::from_secs(5),
    )
    .await
    .unwrap();

    store.save_group_name(&group_name).unwrap();

    // what a dependent stage will see
    let later = FileStore::new(store_path(&dir));
    assert_eq!(later.get_group_name().unwrap(), group_name);
}

const GROUP_CARDS: &str = "[data-testid='group-card']";

/// Judge for the create-session stage: only the group created earlier is
/// eligible, inactive and interest-only cards are disqualified, and acting
/// means opening the card and probing for the schedule menu.
struct SessionCapableGroup {
    wanted_group: String,
    interactor: Interactor,
}

impl SessionCapableGroup {
    fn schedule_menu() -> InteractionTarget {
        InteractionTarget::new(Selector::role("menuitem", "Schedule a session"))
            .described("schedule a session menu item")
    }
}

#[async_trait]
impl CandidateJudge for SessionCapableGroup {
    async fn disqualify(
        &self,
        _driver: &dyn PageDriver,
        _candidate: &InteractionTarget,
        signature: &str,
    ) -> EnsayoResult<bool> {
        Ok(signature.contains("Activate your group")
            || signature.contains("I'm interested")
            || !signature.contains(&self.wanted_group))
    }

    async fn act(
        &self,
        _driver: &dyn PageDriver,
        candidate: &InteractionTarget,
        _signature: &str,
    ) -> EnsayoResult<bool> {
        self.interactor.click_robust(candidate).await?;
        self.interactor
            .probe_visible(&Self::schedule_menu(), Duration::from_millis(500))
            .await
    }
}

/// Scripted "My Groups" dashboard holding the stored group plus decoys.
fn my_groups_page(stored_group: &str) -> MockPage {
    let page = MockPage::new();
    let cards = Selector::css(GROUP_CARDS);

    page.insert_many(
        &cards,
        vec![
            MockElement::new("Old Paid Group Activate your group"),
            MockElement::new(format!("{stored_group} 5 Members")),
            MockElement::new("Community Group I'm interested"),
        ],
    );

    // opening any card reveals the chat; only our group's chat carries the
    // schedule menu, revealed on card click
    page.insert(
        SessionCapableGroup::schedule_menu().selector(),
        MockElement::new("Schedule a session").appearing_in(Duration::from_secs(86_400)),
    );
    page.on_click_reveal(
        &cards,
        SessionCapableGroup::schedule_menu().selector(),
        Duration::from_millis(50),
        None,
    );

    // narrowed selector used for artifact re-validation
    page.insert(
        &Selector::css(GROUP_CARDS).with_text(stored_group),
        MockElement::new(format!("{stored_group} 5 Members")),
    );

    page
}

#[tokio::test(start_paused = true)]
async fn session_stage_finds_the_stored_group_and_opens_the_menu() {
    let dir = TempDir::new().unwrap();

    // produced by the earlier stage's process
    {
        let producer = FileStore::new(store_path(&dir));
        producer.save_group_name("Test Group 1736424000000").unwrap();
    }

    // the session stage starts fresh: its own store handle, its own page
    let store = FileStore::new(store_path(&dir));
    let wanted_group = store.get_group_name().unwrap();

    let page = Arc::new(my_groups_page(&wanted_group));
    let base = BasePage::new(page.clone());

    // never trust the artifact blindly: the named group must be rendered
    base.verify_entity_present(&Selector::css(GROUP_CARDS), &wanted_group)
        .await
        .unwrap();

    let judge = SessionCapableGroup {
        wanted_group: wanted_group.clone(),
        interactor: base.interactor().clone(),
    };
    let mut scanner = CandidateScanner::new(Selector::css(GROUP_CARDS));

    match scanner.run(page.as_ref(), &judge).await.unwrap() {
        ScanOutcome::Acted { signature } => assert!(signature.contains(&wanted_group)),
        other => panic!("expected the stored group to be accepted, got {other:?}"),
    }

    // the inactive decoy was evaluated and rejected without being opened
    assert!(scanner
        .visited()
        .contains("Old Paid Group Activate your group"));
}

#[tokio::test(start_paused = true)]
async fn session_stage_skips_when_no_group_is_eligible() {
    let page = Arc::new(MockPage::new());
    let cards = Selector::css(GROUP_CARDS);
    page.insert_many(
        &cards,
        vec![
            MockElement::new("Old Paid Group Activate your group"),
            MockElement::new("Community Group I'm interested"),
        ],
    );

    let base = BasePage::new(page.clone());
    let judge = SessionCapableGroup {
        wanted_group: "Test Group 1736424000000".to_string(),
        interactor: base.interactor().clone(),
    };
    let mut scanner = CandidateScanner::new(cards);

    let outcome = scanner.run(page.as_ref(), &judge).await.unwrap();
    assert!(!outcome.acted());

    // a probing stage converts that into a skip, never a failure
    let stage_outcome = StageOutcome::Skipped {
        reason: "no subscribed group supports Create Session".to_string(),
    };
    assert!(stage_outcome.allows_dependents());
}
