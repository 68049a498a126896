use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::analysis::{Analysis, EngagementStyle, TechnicalLevel};
use crate::extract::Quality;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateName {
    Technical,
    ProblemSolver,
    Community,
    Brief,
}

impl TemplateName {
    pub fn label(&self) -> &'static str {
        match self {
            TemplateName::Technical => "technical",
            TemplateName::ProblemSolver => "problem_solver",
            TemplateName::Community => "community",
            TemplateName::Brief => "brief",
        }
    }

    pub fn all() -> &'static [TemplateName] {
        &[
            TemplateName::Technical,
            TemplateName::ProblemSolver,
            TemplateName::Community,
            TemplateName::Brief,
        ]
    }
}

impl fmt::Display for TemplateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

const TECHNICAL_TEMPLATE: &str = "\
{greeting}

{opening} {compliment}
{technical_note}
{feature_highlight}

{call_to_action}
{link_line}

{closing}
{signature}";

const PROBLEM_SOLVER_TEMPLATE: &str = "\
{greeting}

{problem_hook}
{solution_line}
{feature_highlight}
{availability_note}

{call_to_action}
{link_line}

{closing}
{signature}";

const COMMUNITY_TEMPLATE: &str = "\
{greeting}

{opening} {community_line}
{interest_line}
{social_proof}

{call_to_action}
{link_line}

{closing}
{signature}";

const BRIEF_TEMPLATE: &str = "\
{greeting} {opening}
{solution_line}
{call_to_action} {link_line}
{signature}";

/// Deterministic template choice, fixed priority order.
pub fn select_template(analysis: &Analysis) -> TemplateName {
    if analysis.technical_level == TechnicalLevel::High && analysis.quality == Quality::High {
        TemplateName::Technical
    } else if !analysis.problem_areas.is_empty() {
        TemplateName::ProblemSolver
    } else if analysis.engagement_style == EngagementStyle::Detailed {
        TemplateName::Community
    } else if analysis.engagement_style == EngagementStyle::Brief {
        TemplateName::Brief
    } else {
        TemplateName::Community
    }
}

/// Fill a template's slots from the analysis. Slots with nothing to say
/// stay unfilled and are removed by the catch-all pass, then runs of
/// blank lines are collapsed.
pub fn personalize(template: TemplateName, analysis: &Analysis) -> String {
    let body = match template {
        TemplateName::Technical => TECHNICAL_TEMPLATE,
        TemplateName::ProblemSolver => PROBLEM_SOLVER_TEMPLATE,
        TemplateName::Community => COMMUNITY_TEMPLATE,
        TemplateName::Brief => BRIEF_TEMPLATE,
    };

    let mut message = body.to_string();
    for (slot, value) in fill_slots(analysis) {
        if !value.is_empty() {
            message = message.replace(&format!("{{{}}}", slot), &value);
        }
    }

    let leftover = Regex::new(r"\{[^}]+\}").expect("static regex");
    let message = leftover.replace_all(&message, "").into_owned();

    let blanks = Regex::new(r"\n{3,}").expect("static regex");
    let message = blanks.replace_all(&message, "\n\n").into_owned();

    message.trim().to_string()
}

/// Convenience: pick and fill in one go.
pub fn compose(analysis: &Analysis) -> (TemplateName, String) {
    let template = select_template(analysis);
    (template, personalize(template, analysis))
}

fn fill_slots(analysis: &Analysis) -> Vec<(&'static str, String)> {
    vec![
        ("greeting", "Hi!".to_string()),
        ("opening", generate_opening(analysis)),
        ("compliment", generate_compliment(analysis)),
        ("technical_note", generate_technical_note(analysis)),
        ("problem_hook", generate_problem_hook(analysis)),
        ("solution_line", generate_solution_line()),
        ("feature_highlight", generate_feature_highlight(analysis)),
        ("community_line", generate_community_line()),
        ("interest_line", generate_interest_line(analysis)),
        ("social_proof", generate_social_proof()),
        ("availability_note", generate_availability_note(analysis)),
        ("call_to_action", generate_call_to_action(analysis)),
        ("link_line", generate_link_line()),
        ("closing", generate_closing(analysis)),
        ("signature", "— Jonas".to_string()),
    ]
}

fn generate_opening(analysis: &Analysis) -> String {
    match analysis.engagement_style {
        EngagementStyle::Detailed => {
            "I came across your detailed comment on the pegboard model.".to_string()
        }
        EngagementStyle::Brief => "Saw your comment on the pegboard model.".to_string(),
        EngagementStyle::Standard => "I noticed your comment on the pegboard model.".to_string(),
    }
}

fn generate_compliment(analysis: &Analysis) -> String {
    if analysis.quality == Quality::High {
        "Really appreciated the thought you put into it.".to_string()
    } else {
        "Thanks for sharing your experience.".to_string()
    }
}

fn generate_technical_note(analysis: &Analysis) -> String {
    match analysis.technical_level {
        TechnicalLevel::High => {
            "The mounts are modeled with 0.2 mm clearance and print without supports at 0.2 layer height."
                .to_string()
        }
        TechnicalLevel::Medium => {
            "Everything prints support-free with default slicer profiles.".to_string()
        }
        TechnicalLevel::Low => String::new(),
    }
}

fn generate_problem_hook(analysis: &Analysis) -> String {
    match analysis.problem_areas.first().map(String::as_str) {
        Some("stability") => {
            "Sounds like things keep slipping off your board — that was exactly my starting point."
                .to_string()
        }
        Some("organization") => {
            "I know the cluttered-board feeling all too well.".to_string()
        }
        Some("cable_management") => {
            "Cable spaghetti on a pegboard was the problem that started this whole collection."
                .to_string()
        }
        Some("tool_storage") => {
            "Keeping tools reachable without burying the board is a tricky balance.".to_string()
        }
        _ => String::new(),
    }
}

fn generate_solution_line() -> String {
    "I designed a set of snap-in SKÅDIS accessories that might help.".to_string()
}

fn generate_feature_highlight(analysis: &Analysis) -> String {
    match analysis.interests.first().map(String::as_str) {
        Some("mounting_solutions") => {
            "The twist-lock mounts hold a surprising amount of weight without drooping.".to_string()
        }
        Some("workshop_organization") => {
            "The modular holders are sized for common workshop tools and bits.".to_string()
        }
        Some("diy_projects") => {
            "Everything is parametric, so remixing it for your own projects is easy.".to_string()
        }
        _ => "The set covers hooks, bins and a few specialty holders.".to_string(),
    }
}

fn generate_community_line() -> String {
    "It's great to see how many people are customizing their boards.".to_string()
}

fn generate_interest_line(analysis: &Analysis) -> String {
    if analysis.interests.is_empty() {
        String::new()
    } else {
        "Given what you wrote, I think a couple of the pieces would fit your setup well."
            .to_string()
    }
}

fn generate_social_proof() -> String {
    "A few hundred makers have printed the collection so far.".to_string()
}

fn generate_availability_note(analysis: &Analysis) -> String {
    if analysis
        .problem_areas
        .iter()
        .any(|a| a == "tool_storage")
    {
        "The tool-holder pack just got a size update last week.".to_string()
    } else {
        String::new()
    }
}

fn generate_call_to_action(analysis: &Analysis) -> String {
    if analysis.technical_level == TechnicalLevel::High {
        "The STLs and print profiles are free on my profile if you want to try them.".to_string()
    } else {
        "Feel free to take a look if you're curious.".to_string()
    }
}

fn generate_link_line() -> String {
    "You'll find the full SKÅDIS collection pinned at the top of my profile.".to_string()
}

fn generate_closing(analysis: &Analysis) -> String {
    if analysis.engagement_style == EngagementStyle::Brief {
        String::new()
    } else {
        "Happy printing!".to_string()
    }
}
