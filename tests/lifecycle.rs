mod common;

use std::time::Duration;

use host_dom::Visibility;
use receipt_autofill::{
    AutofillAgent, Config, FieldName, FillCommand, LifecycleEvent, NavigationTrigger, SkipReason,
};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tokio::time::{sleep, timeout};

use common::*;

const PAGE_TWO: &str = "https://forms.example/reimbursement/step-2";

/// Lets spawned tasks catch up without crossing any lifecycle timer.
async fn settle() {
    sleep(Duration::from_millis(10)).await;
}

async fn next_matching(
    events: &mut broadcast::Receiver<LifecycleEvent>,
    wanted: impl Fn(&LifecycleEvent) -> bool,
) -> LifecycleEvent {
    timeout(Duration::from_secs(30), async {
        loop {
            match events.recv().await {
                Ok(event) if wanted(&event) => return event,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => panic!("lifecycle bus closed"),
            }
        }
    })
    .await
    .expect("lifecycle event not observed in time")
}

fn drain(events: &mut broadcast::Receiver<LifecycleEvent>) -> Vec<LifecycleEvent> {
    let mut seen = Vec::new();
    loop {
        match events.try_recv() {
            Ok(event) => seen.push(event),
            Err(TryRecvError::Lagged(_)) => continue,
            Err(_) => return seen,
        }
    }
}

fn is_refill(event: &LifecycleEvent) -> bool {
    matches!(event, LifecycleEvent::Refilled { .. })
}

fn is_skip(event: &LifecycleEvent) -> bool {
    matches!(event, LifecycleEvent::Skipped { .. })
}

async fn agent_on(body: host_dom::NodeSnapshot) -> AutofillAgent {
    let agent = AutofillAgent::new(page(body), &Config::default());
    agent
        .fill(FillCommand::new(profile_record()))
        .await
        .unwrap();
    agent
}

#[tokio::test(start_paused = true)]
async fn client_side_navigation_refills_the_new_page() {
    let agent = agent_on(profile_page()).await;
    let page = agent.page().clone();
    assert_eq!(page.read(|doc| value_of(doc, "purchaser")), "Jordan Lee");

    let watcher = agent.start_watcher();
    let mut events = watcher.subscribe();
    settle().await;

    page.navigate_spa(PAGE_TWO, &receipt_form()).unwrap();

    let navigated = next_matching(&mut events, |e| matches!(e, LifecycleEvent::Navigated(_))).await;
    assert_eq!(
        navigated,
        LifecycleEvent::Navigated(NavigationTrigger::UrlChanged {
            url: PAGE_TWO.to_string()
        })
    );
    let LifecycleEvent::Refilled { forced, summary } = next_matching(&mut events, is_refill).await
    else {
        unreachable!()
    };
    assert!(forced);
    assert_eq!(summary.filled_fields, 5);
    page.read(|doc| {
        assert_eq!(value_of(doc, "vendor"), "Acme");
        assert_eq!(value_of(doc, "amount"), "42.50");
        assert!(is_checked(doc, "pm-oop"));
    });
    // Forced refills do not spend the page budget.
    assert_eq!(agent.session().refill_count(), 0);

    watcher.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn back_navigation_refills_the_restored_page() {
    let agent = agent_on(profile_page()).await;
    let page = agent.page().clone();
    let watcher = agent.start_watcher();
    let mut events = watcher.subscribe();
    settle().await;

    page.navigate_spa(PAGE_TWO, &receipt_form()).unwrap();
    next_matching(&mut events, is_refill).await;

    // The restored page comes back without the values typed earlier.
    let restored = page.history_back(Some(&profile_page())).unwrap();
    assert_eq!(restored.as_deref(), Some(URL));
    assert_eq!(page.read(|doc| value_of(doc, "purchaser")), "");

    let popped = next_matching(&mut events, |e| {
        matches!(
            e,
            LifecycleEvent::Navigated(NavigationTrigger::HistoryPopped { .. })
        )
    })
    .await;
    assert_eq!(
        popped,
        LifecycleEvent::Navigated(NavigationTrigger::HistoryPopped {
            url: URL.to_string()
        })
    );
    let LifecycleEvent::Refilled { forced, .. } = next_matching(&mut events, is_refill).await else {
        unreachable!()
    };
    assert!(forced);
    page.read(|doc| {
        assert_eq!(value_of(doc, "purchaser"), "Jordan Lee");
        assert_eq!(value_of(doc, "netid"), "jl123");
        assert_eq!(value_of(doc, "club"), "Chess Club");
    });

    watcher.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn next_click_counts_as_navigation() {
    let agent = agent_on(profile_page()).await;
    let page = agent.page().clone();
    let watcher = agent.start_watcher();
    let mut events = watcher.subscribe();
    settle().await;

    let next = page.read(|doc| node(doc, "next"));
    page.user_click(next).unwrap();
    settle().await;
    // The host swaps the step in place; the URL stays put.
    page.with_document(|doc| {
        let body = doc.body();
        doc.clear_children(body)?;
        doc.load_into(body, &receipt_form())
    })
    .unwrap();

    let navigated = next_matching(&mut events, |e| matches!(e, LifecycleEvent::Navigated(_))).await;
    assert_eq!(
        navigated,
        LifecycleEvent::Navigated(NavigationTrigger::NextClicked { target: next })
    );
    // The click itself must not hold back the refill it caused.
    let LifecycleEvent::Refilled { forced, .. } = next_matching(&mut events, |e| is_refill(e) || is_skip(e)).await
    else {
        panic!("refill after next click was skipped")
    };
    assert!(forced);
    assert_eq!(page.read(|doc| value_of(doc, "vendor")), "Acme");
    assert_eq!(page.url(), URL);

    watcher.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn hidden_pages_are_not_refilled() {
    let agent = agent_on(profile_page()).await;
    let page = agent.page().clone();
    let watcher = agent.start_watcher();
    let mut events = watcher.subscribe();
    settle().await;

    page.set_visibility(Visibility::Hidden);
    page.navigate_spa(PAGE_TWO, &receipt_form()).unwrap();

    let skipped = next_matching(&mut events, |e| is_refill(e) || is_skip(e)).await;
    assert_eq!(
        skipped,
        LifecycleEvent::Skipped {
            forced: true,
            reason: SkipReason::Hidden
        }
    );
    assert_eq!(page.read(|doc| value_of(doc, "vendor")), "");

    watcher.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn rapid_mutations_refill_at_most_once_per_page() {
    let agent = agent_on(receipt_form()).await;
    let page = agent.page().clone();
    let watcher = agent.start_watcher();
    let mut events = watcher.subscribe();
    settle().await;

    for i in 0..10 {
        append_to_body(&page, &text_group(&format!("Notes {i}"), &format!("notes-{i}")));
        sleep(Duration::from_millis(100)).await;
    }
    sleep(Duration::from_secs(2)).await;

    let seen = drain(&mut events);
    let refills: Vec<_> = seen.iter().filter(|e| is_refill(e)).collect();
    assert_eq!(refills.len(), 1, "events: {seen:?}");
    assert!(matches!(
        refills[0],
        LifecycleEvent::Refilled { forced: false, .. }
    ));
    assert_eq!(agent.session().refill_count(), 1);

    append_to_body(&page, &text_group("Notes 10", "notes-10"));
    let skipped = next_matching(&mut events, |e| is_refill(e) || is_skip(e)).await;
    assert_eq!(
        skipped,
        LifecycleEvent::Skipped {
            forced: false,
            reason: SkipReason::BudgetExhausted
        }
    );

    // Navigation resets the budget and forces a pass anyway.
    page.navigate_spa(PAGE_TWO, &receipt_form()).unwrap();
    let LifecycleEvent::Refilled { forced, .. } = next_matching(&mut events, is_refill).await else {
        unreachable!()
    };
    assert!(forced);

    watcher.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn typing_user_holds_back_the_refill() {
    let agent = agent_on(receipt_form()).await;
    let page = agent.page().clone();
    let watcher = agent.start_watcher();
    let mut events = watcher.subscribe();
    settle().await;

    let event_link = page.read(|doc| node(doc, "event"));
    page.user_type(event_link, "https://club.example/lunch").unwrap();
    settle().await;
    append_to_body(&page, &text_group("Notes", "notes"));

    let skipped = next_matching(&mut events, |e| is_refill(e) || is_skip(e)).await;
    assert_eq!(
        skipped,
        LifecycleEvent::Skipped {
            forced: false,
            reason: SkipReason::UserActive
        }
    );
    assert_eq!(
        page.read(|doc| value_of(doc, "event")),
        "https://club.example/lunch"
    );
    assert_eq!(agent.session().refill_count(), 0);

    // Once the user pauses, the next change goes through and still
    // leaves the typed value alone.
    sleep(Duration::from_secs(4)).await;
    append_to_body(&page, &text_group("More notes", "more-notes"));
    let LifecycleEvent::Refilled { forced, summary } = next_matching(&mut events, is_refill).await
    else {
        unreachable!()
    };
    assert!(!forced);
    assert!(!summary.result(FieldName::EventLink).unwrap().filled);
    assert_eq!(
        page.read(|doc| value_of(doc, "event")),
        "https://club.example/lunch"
    );

    watcher.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn nearly_complete_pages_are_left_alone() {
    let agent = agent_on(receipt_form()).await;
    let page = agent.page().clone();
    let watcher = agent.start_watcher();
    let mut events = watcher.subscribe();
    settle().await;

    // Only the event link is still empty.
    page.navigate_spa(PAGE_TWO, &receipt_form_with_vendor(prefilled_group(
        "Vendor Name",
        "vendor",
        "Other Co.",
    )))
    .unwrap();
    page.with_document(|doc| {
        for id in ["amount", "description"] {
            let control = node(doc, id);
            doc.set_value(control, "typed by hand")?;
        }
        for id in ["pm-oop", "pt-food"] {
            let control = node(doc, id);
            doc.set_checked(control, true)?;
        }
        Ok::<_, host_dom::DomError>(())
    })
    .unwrap();

    let skipped = next_matching(&mut events, |e| is_refill(e) || is_skip(e)).await;
    assert_eq!(
        skipped,
        LifecycleEvent::Skipped {
            forced: true,
            reason: SkipReason::TooFewEmptyFields {
                empty: 1,
                required: 2
            }
        }
    );

    watcher.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn watcher_stops_with_the_page() {
    let agent = agent_on(receipt_form()).await;
    let watcher = agent.start_watcher();
    settle().await;
    assert!(!watcher.is_finished());

    agent.page().close();
    settle().await;
    assert!(watcher.is_finished());
}
