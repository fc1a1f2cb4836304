//! Inverter-schedule projector: consolidates the 24-hour `Schedule` into a
//! bounded list of time-of-use segments, inserting wake-up windows ahead of
//! charging runs and a mandatory end-of-day idle tail.

use thiserror::Error;
use crate::schedule::{HourState, Schedule};

#[derive(Error, Debug)]
pub enum ProjectorError {
    #[error("max_tou_segments must be at least 1")]
    InvalidSegmentCap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    BatteryFirst,
    LoadFirst,
}

#[derive(Debug, Clone)]
pub struct TouSegment {
    pub id: u32,
    pub mode: Mode,
    pub start_hhmm: String,
    pub end_hhmm: String,
    pub enabled: bool,
    pub grid_charge: bool,
    pub discharge_rate_pct: u8,
}

#[derive(Debug, Clone)]
pub struct TouPlan {
    /// Full hour-by-hour segment breakdown, both modes, for diagnostics/logging.
    pub detailed: Vec<TouSegment>,
    /// Battery-first-only segments actually written to the inverter's TOU table.
    pub compact: Vec<TouSegment>,
}

struct Run {
    state: HourState,
    start_hour: usize,
    end_hour: usize,
}

fn hhmm(hour: usize, minute: u32) -> String {
    format!("{:02}:{:02}", hour, minute)
}

fn map_mode(state: HourState) -> Mode {
    match state {
        HourState::Discharging => Mode::LoadFirst,
        HourState::Charging | HourState::Idle => Mode::BatteryFirst,
    }
}

/// A load-first window that keeps the inverter awake without driving charge
/// or discharge (used for both the pre-charge wake-up gap and the mandatory
/// end-of-day tail).
fn idle_wake_segment(id: u32, start_hour: usize, start_min: u32, end_hour: usize, end_min: u32) -> TouSegment {
    TouSegment {
        id,
        mode: Mode::LoadFirst,
        start_hhmm: hhmm(start_hour, start_min),
        end_hhmm: hhmm(end_hour, end_min),
        enabled: true,
        grid_charge: false,
        discharge_rate_pct: 0,
    }
}

fn compute_runs(schedule: &Schedule) -> Vec<Run> {
    let mut runs = Vec::new();
    let mut start = 0;
    let mut state = schedule.intervals[0].state;

    for h in 1..24 {
        if schedule.intervals[h].state != state {
            runs.push(Run { state, start_hour: start, end_hour: h - 1 });
            start = h;
            state = schedule.intervals[h].state;
        }
    }
    runs.push(Run { state, start_hour: start, end_hour: 23 });
    runs
}

fn compact_from_detailed(detailed: &[TouSegment], max_tou_segments: usize) -> Vec<TouSegment> {
    let mut compact = Vec::new();
    let mut current_start: Option<String> = None;

    for (i, seg) in detailed.iter().enumerate() {
        if seg.mode == Mode::BatteryFirst {
            if current_start.is_none() {
                current_start = Some(seg.start_hhmm.clone());
            }
        } else if let Some(start) = current_start.take() {
            compact.push(TouSegment {
                id: compact.len() as u32 + 1,
                mode: Mode::BatteryFirst,
                start_hhmm: start,
                end_hhmm: detailed[i - 1].end_hhmm.clone(),
                enabled: true,
                grid_charge: false,
                discharge_rate_pct: 0,
            });
        }
    }
    if let Some(start) = current_start {
        compact.push(TouSegment {
            id: compact.len() as u32 + 1,
            mode: Mode::BatteryFirst,
            start_hhmm: start,
            end_hhmm: detailed.last().unwrap().end_hhmm.clone(),
            enabled: true,
            grid_charge: false,
            discharge_rate_pct: 0,
        });
    }

    compact.truncate(max_tou_segments);
    compact
}

/// Projects a 24-hour schedule into a bounded `TouPlan`.
///
/// # Arguments
///
/// * 'schedule' - the canonical 24-slot schedule to project
/// * 'max_tou_segments' - the inverter's TOU segment capacity (typically 8)
pub fn project(schedule: &Schedule, max_tou_segments: usize) -> Result<TouPlan, ProjectorError> {
    if max_tou_segments == 0 {
        return Err(ProjectorError::InvalidSegmentCap);
    }

    let runs = compute_runs(schedule);
    let mut detailed: Vec<TouSegment> = Vec::new();
    let mut next_id: u32 = 1;

    for run in &runs {
        if run.state == HourState::Charging && run.start_hour > 0 {
            let wake_hour = run.start_hour - 1;
            if let Some(prev) = detailed.last_mut() {
                prev.end_hhmm = hhmm(wake_hour, 44);
            }
            detailed.push(idle_wake_segment(next_id, wake_hour, 45, wake_hour, 59));
            next_id += 1;
        }

        detailed.push(TouSegment {
            id: next_id,
            mode: map_mode(run.state),
            start_hhmm: hhmm(run.start_hour, 0),
            end_hhmm: hhmm(run.end_hour, 59),
            enabled: true,
            grid_charge: run.state == HourState::Charging,
            discharge_rate_pct: if run.state == HourState::Discharging { 100 } else { 0 },
        });
        next_id += 1;
    }

    if let Some(last) = detailed.last_mut() {
        last.end_hhmm = "23:44".to_string();
    }
    detailed.push(idle_wake_segment(next_id, 23, 45, 23, 59));

    let compact = compact_from_detailed(&detailed, max_tou_segments);

    Ok(TouPlan { detailed, compact })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HourlyCost, PlanResult};

    fn schedule_from_actions(actions: [f64; 24]) -> Schedule {
        let plan = PlanResult {
            actions,
            soe: [3.0; 25],
            hourly_costs: [HourlyCost::default(); 24],
            base_cost: 0.0,
            optimized_cost: 0.0,
            savings: 0.0,
        };
        Schedule::from_plan(&plan)
    }

    #[test]
    fn all_idle_day_is_one_battery_first_segment_plus_tail() {
        let schedule = schedule_from_actions([0.0; 24]);
        let plan = project(&schedule, 8).unwrap();
        assert_eq!(plan.compact.len(), 1);
        assert_eq!(plan.compact[0].start_hhmm, "00:00");
        assert_eq!(plan.compact[0].end_hhmm, "23:44");
        let tail = plan.detailed.last().unwrap();
        assert_eq!(tail.mode, Mode::LoadFirst);
        assert_eq!(tail.start_hhmm, "23:45");
        assert_eq!(tail.end_hhmm, "23:59");
    }

    #[test]
    fn charging_after_idle_inserts_wake_up_gap() {
        let mut actions = [0.0; 24];
        actions[5] = 6.0;
        let schedule = schedule_from_actions(actions);
        let plan = project(&schedule, 8).unwrap();

        let wake = plan
            .detailed
            .iter()
            .find(|s| s.start_hhmm == "04:45")
            .expect("wake-up segment present");
        assert_eq!(wake.mode, Mode::LoadFirst);
        assert_eq!(wake.end_hhmm, "04:59");

        let idle_before = plan.detailed.iter().find(|s| s.start_hhmm == "00:00").unwrap();
        assert_eq!(idle_before.end_hhmm, "04:44");
    }

    #[test]
    fn action_in_hour_23_still_ends_at_2344() {
        let mut actions = [0.0; 24];
        actions[23] = -5.2;
        let schedule = schedule_from_actions(actions);
        let plan = project(&schedule, 8).unwrap();

        let last_regular = &plan.detailed[plan.detailed.len() - 2];
        assert_eq!(last_regular.end_hhmm, "23:44");
        let tail = plan.detailed.last().unwrap();
        assert_eq!(tail.start_hhmm, "23:45");
        assert_eq!(tail.end_hhmm, "23:59");
    }

    #[test]
    fn compact_list_trims_to_max_segments() {
        // Alternate charge/idle every hour to produce many short battery-first runs.
        let mut actions = [0.0; 24];
        for h in (0..24).step_by(2) {
            actions[h] = 1.0;
        }
        let schedule = schedule_from_actions(actions);
        let plan = project(&schedule, 3).unwrap();
        assert!(plan.compact.len() <= 3);
    }
}
