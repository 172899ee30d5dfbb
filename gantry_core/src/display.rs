//! Two-line status content for the operator display.
//!
//! Pure function of the workflow state plus current/target position; the
//! rendering device behind the `Display` trait is out of scope. Grid cells
//! are shown one-based, as the operator reads them on the board.

use crate::workflow::{GridPos, MarkerObservation, PlateTarget, WorkflowState};

/// Character width of one display line.
pub const LINE_LEN: usize = 16;

pub fn render(
    state: &WorkflowState,
    current: Option<GridPos>,
    plates: &[PlateTarget; 2],
    observation: Option<&MarkerObservation>,
) -> (String, String) {
    let (line0, line1) = match state {
        WorkflowState::Init => ("PLATE STATION".to_string(), "INITIALIZING...".to_string()),
        WorkflowState::Homing(_) => ("HOMING...".to_string(), String::new()),
        WorkflowState::WaitPlate { slot, pending } => {
            if *pending {
                let id = observation.map(|o| o.id).unwrap_or_default();
                (format!("ID {id} DETECTED"), "PRESS TO CONFIRM".to_string())
            } else {
                (format!("PLACE PLATE {}", slot.label()), "at (1,1)".to_string())
            }
        }
        WorkflowState::PickPlate { slot, .. } => {
            let (r, c) = plates[slot.index()].target.one_based();
            let id = observation.map(|o| o.id).unwrap_or_default();
            (format!("ID {id} PICKED"), format!("T:({r},{c}) GRIP"))
        }
        WorkflowState::MovePlate { slot } => {
            let (tr, tc) = plates[slot.index()].target.one_based();
            let cur = match current {
                Some(pos) => {
                    let (cr, cc) = pos.one_based();
                    format!("C:({cr},{cc})")
                }
                None => "C:(-,-)".to_string(),
            };
            (format!("T:({tr},{tc}) {cur}"), "JOG TO TARGET".to_string())
        }
        WorkflowState::VerifyPlate { .. } => {
            ("VERIFYING...".to_string(), "HOLD POSITION".to_string())
        }
        WorkflowState::Complete => ("** SUCCESS **".to_string(), "FREE JOG MODE".to_string()),
    };
    (truncate(line0), truncate(line1))
}

fn truncate(mut s: String) -> String {
    s.truncate(LINE_LEN);
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{PlatePlan, PlateSlot};

    fn plates() -> [PlateTarget; 2] {
        PlatePlan::new(
            GridPos::new(4, 3).expect("in range"),
            1,
            GridPos::new(2, 1).expect("in range"),
            2,
        )
        .plates
    }

    #[test]
    fn move_state_shows_target_and_current() {
        let state = WorkflowState::MovePlate {
            slot: PlateSlot::First,
        };
        let (l0, l1) = render(&state, GridPos::new(0, 0), &plates(), None);
        assert_eq!(l0, "T:(5,4) C:(1,1)");
        assert_eq!(l1, "JOG TO TARGET");
    }

    #[test]
    fn unknown_position_renders_placeholder() {
        let state = WorkflowState::MovePlate {
            slot: PlateSlot::Second,
        };
        let (l0, _) = render(&state, None, &plates(), None);
        assert_eq!(l0, "T:(3,2) C:(-,-)");
    }

    #[test]
    fn pending_wait_prompts_for_confirmation() {
        let state = WorkflowState::WaitPlate {
            slot: PlateSlot::First,
            pending: true,
        };
        let obs = MarkerObservation {
            id: 7,
            pos: GridPos::ORIGIN,
            seen_at_ms: 0,
        };
        let (l0, l1) = render(&state, Some(GridPos::ORIGIN), &plates(), Some(&obs));
        assert_eq!(l0, "ID 7 DETECTED");
        assert_eq!(l1, "PRESS TO CONFIRM");
    }

    #[test]
    fn lines_never_exceed_display_width() {
        let state = WorkflowState::WaitPlate {
            slot: PlateSlot::First,
            pending: true,
        };
        let obs = MarkerObservation {
            id: i32::MAX,
            pos: GridPos::ORIGIN,
            seen_at_ms: 0,
        };
        let (l0, l1) = render(&state, None, &plates(), Some(&obs));
        assert!(l0.len() <= LINE_LEN && l1.len() <= LINE_LEN);
    }
}
