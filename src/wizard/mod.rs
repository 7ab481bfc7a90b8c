// Step state machine
//
// Ordered step sequence, route mapping, and the forward-entry guard. Pure
// functions so the whole machine is unit-testable without a UI harness.

use crate::models::application::Step;

/// Navigable path for a step. Routes are static and unique.
pub fn route_for_step(step: Step) -> &'static str {
    match step {
        Step::PersonalInformation => "/personalInformation",
        Step::FamilyAndFinancialInformation => "/familyAndFinancialInformation",
        Step::SituationInformation => "/situationInformation",
        Step::Submit => "/submit",
    }
}

/// Resolve a path back to its step. A path nested under a step's route
/// (`route + "/..."`) resolves to that step as well.
pub fn step_for_route(path: &str) -> Option<Step> {
    for step in [
        Step::PersonalInformation,
        Step::FamilyAndFinancialInformation,
        Step::SituationInformation,
        Step::Submit,
    ] {
        let route = route_for_step(step);
        if path == route || path.starts_with(&format!("{}/", route)) {
            return Some(step);
        }
    }
    None
}

/// A target step is reachable only when the recorded progress has gotten
/// there: jumping ahead of `current` is invalid, revisiting is not.
pub fn is_invalid_navigation(current: Step, target: Step) -> bool {
    current < target
}

/// Next editable step; capped at the last editable step.
pub fn advance(step: Step) -> Step {
    match step {
        Step::PersonalInformation => Step::FamilyAndFinancialInformation,
        Step::FamilyAndFinancialInformation => Step::SituationInformation,
        Step::SituationInformation => Step::SituationInformation,
        Step::Submit => Step::Submit,
    }
}

/// Previous step; floored at the first.
pub fn retreat(step: Step) -> Step {
    match step {
        Step::PersonalInformation => Step::PersonalInformation,
        Step::FamilyAndFinancialInformation => Step::PersonalInformation,
        Step::SituationInformation => Step::FamilyAndFinancialInformation,
        Step::Submit => Step::SituationInformation,
    }
}

/// The single startup redirect: when the persisted step is not terminal and
/// the on-screen path does not already match it, return the route to redirect
/// to. Runs once per session mount, not on every render.
pub fn reconcile_initial_route(saved_step: Step, current_path: &str) -> Option<&'static str> {
    if saved_step == Step::Submit {
        return None;
    }
    if current_path == "/" || step_for_route(current_path) != Some(saved_step) {
        return Some(route_for_step(saved_step));
    }
    None
}

/// Progress over the editable steps, as a whole percentage.
pub fn progress_percent(step: Step) -> u16 {
    let total = Step::EDITABLE.len();
    let position = step.index().min(total - 1) + 1;
    ((position * 100) / total) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_mapping_is_a_bijection_over_all_steps() {
        for step in [
            Step::PersonalInformation,
            Step::FamilyAndFinancialInformation,
            Step::SituationInformation,
            Step::Submit,
        ] {
            assert_eq!(step_for_route(route_for_step(step)), Some(step));
        }
    }

    #[test]
    fn nested_paths_resolve_to_their_step() {
        assert_eq!(
            step_for_route("/personalInformation/details"),
            Some(Step::PersonalInformation)
        );
        assert_eq!(step_for_route("/unknown"), None);
        assert_eq!(step_for_route("/"), None);
    }

    #[test]
    fn jumping_ahead_of_recorded_progress_is_invalid() {
        assert!(is_invalid_navigation(
            Step::PersonalInformation,
            Step::SituationInformation
        ));
        assert!(is_invalid_navigation(
            Step::FamilyAndFinancialInformation,
            Step::Submit
        ));
        // Revisiting the current or an earlier step is allowed.
        assert!(!is_invalid_navigation(
            Step::SituationInformation,
            Step::SituationInformation
        ));
        assert!(!is_invalid_navigation(
            Step::SituationInformation,
            Step::PersonalInformation
        ));
    }

    #[test]
    fn advance_caps_at_last_editable_step() {
        assert_eq!(
            advance(Step::PersonalInformation),
            Step::FamilyAndFinancialInformation
        );
        assert_eq!(
            advance(Step::SituationInformation),
            Step::SituationInformation
        );
    }

    #[test]
    fn retreat_floors_at_first_step() {
        assert_eq!(retreat(Step::PersonalInformation), Step::PersonalInformation);
        assert_eq!(
            retreat(Step::SituationInformation),
            Step::FamilyAndFinancialInformation
        );
    }

    #[test]
    fn initial_reconcile_redirects_index_path_to_saved_step() {
        assert_eq!(
            reconcile_initial_route(Step::FamilyAndFinancialInformation, "/"),
            Some("/familyAndFinancialInformation")
        );
    }

    #[test]
    fn initial_reconcile_redirects_mismatched_path() {
        assert_eq!(
            reconcile_initial_route(Step::SituationInformation, "/personalInformation"),
            Some("/situationInformation")
        );
    }

    #[test]
    fn initial_reconcile_is_a_no_op_when_already_in_place() {
        assert_eq!(
            reconcile_initial_route(Step::PersonalInformation, "/personalInformation"),
            None
        );
    }

    #[test]
    fn initial_reconcile_skips_terminal_step() {
        assert_eq!(reconcile_initial_route(Step::Submit, "/"), None);
    }

    #[test]
    fn progress_spans_the_editable_steps() {
        assert_eq!(progress_percent(Step::PersonalInformation), 33);
        assert_eq!(progress_percent(Step::FamilyAndFinancialInformation), 66);
        assert_eq!(progress_percent(Step::SituationInformation), 100);
        assert_eq!(progress_percent(Step::Submit), 100);
    }
}
