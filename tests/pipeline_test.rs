//! End-to-end pipeline test over a fixture page: extract prospects,
//! analyze them, compose messages and keep the outreach log honest.

use std::fs;

use alcance::analysis::analyze;
use alcance::extract::{extract_prospects, Quality};
use alcance::message::{compose, personalize, select_template};
use alcance::outreach::{log_message, record_response, uncontacted, ResponseStatus};
use alcance::storage::Store;

const FIXTURE_PAGE: &str = r#"
<html>
<head><title>SKÅDIS tool holder collection</title></head>
<body>
  <h1>Pegboard accessory pack</h1>
  <div class="comments">
    <div class="comment">
      <a href="/@workshop_wolf">workshop_wolf</a>
      <p>Printed the whole set in PETG with 0.2 layer height and 25% infill,
      had to adjust the tolerance on the hooks but now everything snaps in
      perfectly. My workshop pegboard is finally organized and the tools
      stopped falling off the wall.</p>
      <span>Like</span> <span>Reply</span> <span>34 likes</span>
    </div>
    <div class="comment">
      <a href="/@tidy_tina">tidy_tina</a>
      <p>My craft corner was such a mess, these holders fixed the clutter!</p>
      <span>Like</span> <span>Reply</span> <span>5 likes</span>
    </div>
    <div class="comment">
      <a href="/@lurker99">lurker99</a>
      <p>nice</p>
    </div>
  </div>
</body>
</html>"#;

const SOURCE_URL: &str = "https://example.com/model/skadis-pack";

fn temp_store(tag: &str) -> Store {
    let dir = std::env::temp_dir().join(format!("alcance-pipeline-{}-{}", tag, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    Store::open(&dir).unwrap()
}

#[test]
fn extraction_finds_substantive_commenters_only() {
    let prospects = extract_prospects(FIXTURE_PAGE, SOURCE_URL);

    let usernames: Vec<&str> = prospects.iter().map(|p| p.username.as_str()).collect();
    assert!(usernames.contains(&"workshop_wolf"));
    assert!(usernames.contains(&"tidy_tina"));
    // One-word comments never qualify.
    assert!(!usernames.contains(&"lurker99"));

    for p in &prospects {
        let len = p.text.chars().count();
        assert!((20..=300).contains(&len));
        assert!(p.score > 0);
        assert_eq!(p.source, SOURCE_URL);
        assert!(p.profile_link.starts_with("https://example.com/@"));
    }
}

#[test]
fn technical_detailed_commenter_gets_the_technical_template() {
    let prospects = extract_prospects(FIXTURE_PAGE, SOURCE_URL);
    let wolf = prospects
        .iter()
        .find(|p| p.username == "workshop_wolf")
        .expect("workshop_wolf extracted");

    assert_eq!(wolf.quality, Quality::High);

    let analysis = analyze(wolf);
    assert!(analysis.problem_areas.contains(&"stability".to_string()));
    assert!(analysis
        .interests
        .contains(&"workshop_organization".to_string()));

    let template = select_template(&analysis);
    assert_eq!(template.label(), "technical");

    let message = personalize(template, &analysis);
    assert!(!message.is_empty());
    assert!(!message.contains('{') && !message.contains('}'));
}

#[test]
fn full_send_flow_keeps_the_log_and_contacted_set_consistent() {
    let store = temp_store("send-flow");
    let prospects = extract_prospects(FIXTURE_PAGE, SOURCE_URL);
    store.append_prospects(&prospects).unwrap();

    let stored = store.load_prospects().unwrap();
    let log = store.load_log().unwrap();
    assert_eq!(uncontacted(&stored, &log).len(), stored.len());

    // Send to the first prospect.
    let target = stored[0].clone();
    let analysis = analyze(&target);
    let (template, message) = compose(&analysis);
    log_message(&store, &target, &message, template.label()).unwrap();

    let log = store.load_log().unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].response_status, ResponseStatus::Sent);
    assert_eq!(store.load_stats().unwrap().total_messages, 1);

    // The sender drops out of the uncontacted set, case-insensitively.
    let open = uncontacted(&stored, &log);
    assert_eq!(open.len(), stored.len() - 1);
    assert!(open
        .iter()
        .all(|p| !p.username.eq_ignore_ascii_case(&target.username)));

    // A reply updates the entry and the aggregate rates.
    record_response(&store, &target.username, ResponseStatus::Positive).unwrap();
    let stats = store.load_stats().unwrap();
    assert_eq!(stats.responses.positive, 1);
    assert!((stats.responses.response_rate - 100.0).abs() < f32::EPSILON);
}
