use std::collections::{HashMap, HashSet, VecDeque};

use chrono::NaiveDate;
use uuid::Uuid;

use super::PlanningError;
use crate::db::enums::DependencyType;

/// Working hours that make up one scheduled day when only an estimate is known.
pub const HOURS_PER_DAY: f64 = 8.0;

#[derive(Debug, Clone)]
pub struct ScheduleTask {
    pub id: Uuid,
    pub planned_start: Option<NaiveDate>,
    pub planned_end: Option<NaiveDate>,
    pub estimated_hours: Option<f64>,
    pub is_milestone: bool,
}

impl ScheduleTask {
    /// Duration in calendar days. Milestones take no time.
    pub fn duration_days(&self) -> i64 {
        if self.is_milestone {
            return 0;
        }
        match (self.planned_start, self.planned_end) {
            (Some(start), Some(end)) => ((end - start).num_days() + 1).max(1),
            _ => self
                .estimated_hours
                .filter(|h| *h > 0.0)
                .map(|h| (h / HOURS_PER_DAY).ceil() as i64)
                .unwrap_or(1)
                .max(1),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ScheduleLink {
    pub predecessor_id: Uuid,
    pub successor_id: Uuid,
    pub kind: DependencyType,
    pub lag_days: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledTask {
    pub id: Uuid,
    pub duration_days: i64,
    pub early_start: NaiveDate,
    pub early_finish: NaiveDate,
    pub late_start: NaiveDate,
    pub late_finish: NaiveDate,
    pub total_float_days: i64,
    pub is_critical: bool,
}

#[derive(Debug, Clone)]
pub struct Schedule {
    pub project_start: NaiveDate,
    pub project_finish: NaiveDate,
    /// Same order as the input tasks.
    pub tasks: Vec<ScheduledTask>,
    /// Critical tasks in topological order.
    pub critical_path: Vec<Uuid>,
}

/// Critical path method over calendar days.
///
/// Internally every task occupies the half-open day range `[start, start + duration)`
/// counted from the project origin; reported finish dates are the last occupied day.
/// `fallback_start` anchors the schedule when no task carries a planned start.
pub fn compute_schedule(
    tasks: &[ScheduleTask],
    links: &[ScheduleLink],
    fallback_start: NaiveDate,
) -> Result<Schedule, PlanningError> {
    let origin = tasks
        .iter()
        .filter_map(|t| t.planned_start)
        .min()
        .unwrap_or(fallback_start);

    if tasks.is_empty() {
        return Ok(Schedule {
            project_start: origin,
            project_finish: origin,
            tasks: Vec::new(),
            critical_path: Vec::new(),
        });
    }

    let index: HashMap<Uuid, usize> = tasks.iter().enumerate().map(|(i, t)| (t.id, i)).collect();
    for link in links {
        for id in [link.predecessor_id, link.successor_id] {
            if !index.contains_key(&id) {
                return Err(PlanningError::UnknownTask(id));
            }
        }
    }

    let order = topological_order(tasks, links, &index)?;
    let duration: Vec<i64> = tasks.iter().map(ScheduleTask::duration_days).collect();

    let mut incoming: Vec<Vec<&ScheduleLink>> = vec![Vec::new(); tasks.len()];
    let mut outgoing: Vec<Vec<&ScheduleLink>> = vec![Vec::new(); tasks.len()];
    for link in links {
        incoming[index[&link.successor_id]].push(link);
        outgoing[index[&link.predecessor_id]].push(link);
    }

    // Forward pass
    let mut es = vec![0i64; tasks.len()];
    let mut ef = vec![0i64; tasks.len()];
    for &i in &order {
        let mut start = tasks[i]
            .planned_start
            .map(|d| (d - origin).num_days())
            .unwrap_or(0)
            .max(0);
        for link in &incoming[i] {
            let p = index[&link.predecessor_id];
            let lag = link.lag_days as i64;
            let bound = match link.kind {
                DependencyType::FinishToStart => ef[p] + lag,
                DependencyType::StartToStart => es[p] + lag,
                DependencyType::FinishToFinish => ef[p] + lag - duration[i],
                DependencyType::StartToFinish => es[p] + lag - duration[i],
            };
            start = start.max(bound);
        }
        es[i] = start;
        ef[i] = start + duration[i];
    }

    let finish = ef.iter().copied().max().unwrap_or(0);

    // Backward pass
    let mut ls = vec![0i64; tasks.len()];
    let mut lf = vec![0i64; tasks.len()];
    for &i in order.iter().rev() {
        let mut late_finish = finish;
        for link in &outgoing[i] {
            let s = index[&link.successor_id];
            let lag = link.lag_days as i64;
            let bound = match link.kind {
                DependencyType::FinishToStart => ls[s] - lag,
                DependencyType::StartToStart => ls[s] - lag + duration[i],
                DependencyType::FinishToFinish => lf[s] - lag,
                DependencyType::StartToFinish => lf[s] - lag + duration[i],
            };
            late_finish = late_finish.min(bound);
        }
        lf[i] = late_finish;
        ls[i] = late_finish - duration[i];
    }

    let day = |offset: i64| origin + chrono::Duration::days(offset);
    let last_day = |start: i64, end: i64| day(if end > start { end - 1 } else { start });

    let scheduled: Vec<ScheduledTask> = tasks
        .iter()
        .enumerate()
        .map(|(i, task)| {
            let total_float = ls[i] - es[i];
            ScheduledTask {
                id: task.id,
                duration_days: duration[i],
                early_start: day(es[i]),
                early_finish: last_day(es[i], ef[i]),
                late_start: day(ls[i]),
                late_finish: last_day(ls[i], lf[i]),
                total_float_days: total_float,
                is_critical: total_float <= 0,
            }
        })
        .collect();

    let critical_path = order
        .iter()
        .filter(|&&i| scheduled[i].is_critical)
        .map(|&i| tasks[i].id)
        .collect();

    let project_finish = (0..tasks.len())
        .map(|i| last_day(es[i], ef[i]))
        .max()
        .unwrap_or(origin);

    Ok(Schedule {
        project_start: origin,
        project_finish,
        tasks: scheduled,
        critical_path,
    })
}

/// Kahn's algorithm; ties are broken by input order so output is stable.
fn topological_order(
    tasks: &[ScheduleTask],
    links: &[ScheduleLink],
    index: &HashMap<Uuid, usize>,
) -> Result<Vec<usize>, PlanningError> {
    let mut in_degree = vec![0usize; tasks.len()];
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); tasks.len()];
    for link in links {
        let p = index[&link.predecessor_id];
        let s = index[&link.successor_id];
        successors[p].push(s);
        in_degree[s] += 1;
    }

    let mut queue: VecDeque<usize> = (0..tasks.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(tasks.len());
    while let Some(i) = queue.pop_front() {
        order.push(i);
        for &s in &successors[i] {
            in_degree[s] -= 1;
            if in_degree[s] == 0 {
                queue.push_back(s);
            }
        }
    }

    if order.len() != tasks.len() {
        return Err(PlanningError::Cycle(tasks.len() - order.len()));
    }
    Ok(order)
}

/// Whether adding `predecessor -> successor` to `edges` would close a cycle.
pub fn would_create_cycle(edges: &[(Uuid, Uuid)], predecessor: Uuid, successor: Uuid) -> bool {
    if predecessor == successor {
        return true;
    }

    let mut adjacency: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for &(from, to) in edges {
        adjacency.entry(from).or_default().push(to);
    }

    // A path successor ~> predecessor means the new edge closes a loop.
    let mut seen = HashSet::new();
    let mut stack = vec![successor];
    while let Some(node) = stack.pop() {
        if node == predecessor {
            return true;
        }
        if !seen.insert(node) {
            continue;
        }
        if let Some(next) = adjacency.get(&node) {
            stack.extend(next.iter().copied());
        }
    }
    false
}

/// Whether making `new_parent` the parent of `task_id` would put the task
/// under its own subtree. `parents` maps each task to its current parent.
pub fn parent_creates_cycle(
    parents: &HashMap<Uuid, Option<Uuid>>,
    task_id: Uuid,
    new_parent: Uuid,
) -> bool {
    let mut current = Some(new_parent);
    let mut hops = 0usize;
    while let Some(id) = current {
        if id == task_id || hops > parents.len() {
            return true;
        }
        current = parents.get(&id).copied().flatten();
        hops += 1;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn task(start: &str, end: &str) -> ScheduleTask {
        ScheduleTask {
            id: Uuid::new_v4(),
            planned_start: Some(date(start)),
            planned_end: Some(date(end)),
            estimated_hours: None,
            is_milestone: false,
        }
    }

    fn fs(pred: &ScheduleTask, succ: &ScheduleTask, lag: i32) -> ScheduleLink {
        ScheduleLink {
            predecessor_id: pred.id,
            successor_id: succ.id,
            kind: DependencyType::FinishToStart,
            lag_days: lag,
        }
    }

    #[test]
    fn chain_with_parallel_branch() {
        // A(3d) -> B(2d) -> D(1d); A -> C(1d) -> D
        let a = task("2026-03-02", "2026-03-04");
        let b = task("2026-03-05", "2026-03-06");
        let c = task("2026-03-05", "2026-03-05");
        let d = task("2026-03-07", "2026-03-07");
        let links = vec![fs(&a, &b, 0), fs(&b, &d, 0), fs(&a, &c, 0), fs(&c, &d, 0)];
        let tasks = vec![a.clone(), b.clone(), c.clone(), d.clone()];

        let schedule = compute_schedule(&tasks, &links, date("2026-01-01")).unwrap();
        assert_eq!(schedule.project_start, date("2026-03-02"));
        assert_eq!(schedule.project_finish, date("2026-03-07"));
        assert_eq!(schedule.critical_path, vec![a.id, b.id, d.id]);

        let c_sched = &schedule.tasks[2];
        assert_eq!(c_sched.early_start, date("2026-03-05"));
        assert_eq!(c_sched.late_start, date("2026-03-06"));
        assert_eq!(c_sched.total_float_days, 1);
        assert!(!c_sched.is_critical);
    }

    #[test]
    fn lag_pushes_successor() {
        let a = task("2026-03-02", "2026-03-02");
        let b = task("2026-03-02", "2026-03-03");
        let tasks = vec![a.clone(), b.clone()];
        let schedule = compute_schedule(&tasks, &[fs(&a, &b, 2)], date("2026-01-01")).unwrap();
        assert_eq!(schedule.tasks[1].early_start, date("2026-03-05"));
        assert_eq!(schedule.tasks[1].early_finish, date("2026-03-06"));
    }

    #[test]
    fn start_to_start_and_finish_to_finish() {
        let a = task("2026-03-02", "2026-03-06");
        let b = task("2026-03-02", "2026-03-03");
        let c = task("2026-03-02", "2026-03-02");
        let links = vec![
            ScheduleLink {
                predecessor_id: a.id,
                successor_id: b.id,
                kind: DependencyType::StartToStart,
                lag_days: 1,
            },
            ScheduleLink {
                predecessor_id: a.id,
                successor_id: c.id,
                kind: DependencyType::FinishToFinish,
                lag_days: 0,
            },
        ];
        let tasks = vec![a, b, c];
        let schedule = compute_schedule(&tasks, &links, date("2026-01-01")).unwrap();
        assert_eq!(schedule.tasks[1].early_start, date("2026-03-03"));
        assert_eq!(schedule.tasks[2].early_start, date("2026-03-06"));
        assert_eq!(schedule.tasks[2].early_finish, date("2026-03-06"));
        assert!(schedule.tasks[2].is_critical);
    }

    #[test]
    fn milestone_has_zero_duration() {
        let a = task("2026-03-02", "2026-03-03");
        let mut m = task("2026-03-02", "2026-03-02");
        m.is_milestone = true;
        let tasks = vec![a.clone(), m.clone()];
        let schedule = compute_schedule(&tasks, &[fs(&a, &m, 0)], date("2026-01-01")).unwrap();
        assert_eq!(schedule.tasks[1].duration_days, 0);
        assert_eq!(schedule.tasks[1].early_start, date("2026-03-04"));
        assert_eq!(schedule.tasks[1].early_finish, date("2026-03-04"));
    }

    #[test]
    fn unscheduled_tasks_use_estimates_and_fallback() {
        let t = ScheduleTask {
            id: Uuid::new_v4(),
            planned_start: None,
            planned_end: None,
            estimated_hours: Some(20.0),
            is_milestone: false,
        };
        assert_eq!(t.duration_days(), 3);
        let schedule = compute_schedule(&[t], &[], date("2026-05-01")).unwrap();
        assert_eq!(schedule.project_start, date("2026-05-01"));
        assert_eq!(schedule.project_finish, date("2026-05-03"));
    }

    #[test]
    fn detects_cycles() {
        let a = task("2026-03-02", "2026-03-02");
        let b = task("2026-03-02", "2026-03-02");
        let links = vec![fs(&a, &b, 0), fs(&b, &a, 0)];
        let err = compute_schedule(&[a, b], &links, date("2026-01-01")).unwrap_err();
        assert_eq!(err, PlanningError::Cycle(2));
    }

    #[test]
    fn cycle_check_for_new_edges() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let edges = vec![(a, b), (b, c)];
        assert!(would_create_cycle(&edges, c, a));
        assert!(would_create_cycle(&edges, a, a));
        assert!(!would_create_cycle(&edges, a, c));
    }

    #[test]
    fn parent_cycle_check() {
        let (root, child, grandchild) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let parents = HashMap::from([
            (root, None),
            (child, Some(root)),
            (grandchild, Some(child)),
        ]);
        assert!(parent_creates_cycle(&parents, root, grandchild));
        assert!(parent_creates_cycle(&parents, child, child));
        assert!(!parent_creates_cycle(&parents, grandchild, root));
    }
}
