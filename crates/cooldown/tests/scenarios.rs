//! End-to-end cooldown scenarios through the public API.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use cooldown::{
    Config, Cooldown, CooldownHandler, EventContext, PlainCooldown, StopCause, SweepProcessor,
};

#[derive(Debug, Clone, PartialEq)]
enum Seen {
    Start(String),
    Stop(StopCause, String),
}

#[derive(Default)]
struct Journal {
    seen: Mutex<Vec<Seen>>,
}

impl Journal {
    fn take(&self) -> Vec<Seen> {
        std::mem::take(&mut *self.seen.lock().unwrap())
    }
}

impl CooldownHandler<String> for Journal {
    fn handle_start(&self, ctx: &mut EventContext<'_, String>, _duration: Duration) {
        self.seen.lock().unwrap().push(Seen::Start(ctx.payload().clone()));
    }

    fn handle_stop(&self, cause: StopCause, payload: &String) {
        self.seen.lock().unwrap().push(Seen::Stop(cause, payload.clone()));
    }
}

fn journaled(journal: &Arc<Journal>) -> Cooldown<String> {
    Cooldown::<String>::builder()
        .shared_handler(journal.clone())
        .build()
        .unwrap()
}

#[tokio::test(start_paused = true)]
async fn non_positive_duration_stays_inactive() {
    let journal = Arc::new(Journal::default());
    let cd = journaled(&journal);

    assert!(!cd.start(Duration::ZERO, "a".into()));
    assert!(!cd.active());
    assert!(journal.take().is_empty());
}

#[tokio::test(start_paused = true)]
async fn remaining_is_bounded_by_duration_after_start() {
    let cd = PlainCooldown::new().unwrap();
    let d = Duration::from_millis(750);

    assert!(cd.start(d, ()));
    assert!(cd.active());
    let remaining = cd.remaining();
    assert!(remaining > Duration::ZERO && remaining <= d);
}

#[tokio::test(start_paused = true)]
async fn natural_expiry_delivers_single_expired_stop() {
    let journal = Arc::new(Journal::default());
    let cd = journaled(&journal);

    assert!(cd.start(Duration::from_secs(1), "a".into()));
    tokio::time::sleep(Duration::from_millis(1100)).await;

    assert!(!cd.active());
    assert_eq!(cd.remaining(), Duration::ZERO);
    assert_eq!(
        journal.take(),
        vec![
            Seen::Start("a".into()),
            Seen::Stop(StopCause::Expired, String::new()),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn pause_then_restart_reports_cancellation_first() {
    let journal = Arc::new(Journal::default());
    let cd = journaled(&journal);

    assert!(cd.start(Duration::from_secs(5), "a".into()));
    assert!(cd.pause("a".into()));
    assert!(cd.restart(Duration::from_secs(1), "b".into()));

    assert!(cd.active());
    assert!(!cd.paused());
    assert_eq!(cd.remaining(), Duration::from_secs(1));
    assert_eq!(
        journal.take(),
        vec![
            Seen::Start("a".into()),
            Seen::Stop(StopCause::Cancelled, "b".into()),
            Seen::Start("b".into()),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn pause_freezes_and_resume_keeps_remaining() {
    let cd = PlainCooldown::new().unwrap();
    cd.start(Duration::from_secs(10), ());
    tokio::time::sleep(Duration::from_secs(4)).await;

    assert!(cd.pause(()));
    let frozen = cd.remaining();
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(cd.remaining(), frozen);
    assert!(cd.active());

    assert!(cd.resume(()));
    tokio::time::sleep(frozen - Duration::from_millis(1)).await;
    assert!(cd.active());
    tokio::time::sleep(Duration::from_millis(2)).await;
    assert!(!cd.active());
}

#[tokio::test(start_paused = true)]
async fn toggle_pause_alternates_while_active() {
    let cd = PlainCooldown::new().unwrap();
    cd.start(Duration::from_secs(10), ());

    for round in 0..6 {
        assert!(cd.toggle_pause(()));
        assert_eq!(cd.paused(), round % 2 == 0);
    }
    assert!(!cd.paused());
}

#[tokio::test(start_paused = true)]
async fn stop_on_inactive_is_silent() {
    let journal = Arc::new(Journal::default());
    let cd = journaled(&journal);

    assert!(!cd.stop("x".into()));
    assert!(journal.take().is_empty());
}

#[tokio::test(start_paused = true)]
async fn processor_sweeps_three_cooldowns() {
    let config = Config::from_toml("[sweep]\ntick_interval_ms = 5").unwrap();
    let processor = Arc::new(SweepProcessor::new());
    let journal = Arc::new(Journal::default());

    let cds: Vec<Cooldown<String>> = [10, 20, 30]
        .into_iter()
        .map(|ms| {
            let cd = Cooldown::<String>::builder()
                .shared_handler(journal.clone())
                .config(&config.cooldown)
                .sweep(Arc::clone(&processor))
                .build()
                .unwrap();
            assert!(cd.start(Duration::from_millis(ms), format!("{ms}ms")));
            cd
        })
        .collect();
    journal.take();

    let tracking = processor.spawn_tracking(config.sweep.tick_interval());
    tokio::time::sleep(Duration::from_millis(25)).await;

    assert_eq!(
        journal.take(),
        vec![
            Seen::Stop(StopCause::Expired, String::new()),
            Seen::Stop(StopCause::Expired, String::new()),
        ]
    );
    assert!(!cds[0].active() && !cds[1].active());
    assert!(cds[2].active());
    assert_eq!(processor.len(), 1);
    assert!(processor.contains(cds[2].id()));

    processor.close();
    tracking.await.unwrap().unwrap();
    assert_eq!(
        journal.take(),
        vec![Seen::Stop(StopCause::Closed, String::new())]
    );
    assert_eq!(processor.metrics().expired, 2);
    assert_eq!(processor.metrics().closed, 1);
}
