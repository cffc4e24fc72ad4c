//! Fuel stop selection.
//!
//! The vehicle leaves with a full tank and may drive at most `range` miles
//! between fills. Fuel bought at a stop is charged at that stop's price for
//! the distance to the next fill (or the destination), so the cost of a
//! sequence of stops `s1 < s2 < ... < sk` is
//!
//! ```text
//! sum(price(si) * (d(s(i+1)) - d(si))) / mpg,   with d(s(k+1)) = total
//! ```
//!
//! Both strategies take candidates ordered by distance from start, then
//! price, then identifier, and return indices into that slice.

use std::cmp::Ordering;

use crate::domain::CandidateStop;

use super::config::OptimizerStrategy;
use super::index::window;

/// Relative tolerance when comparing plan costs.
const COST_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OptimizeError {
    /// No stop or destination is reachable from the last possible fill.
    #[error(
        "route is not drivable: from mile {position:.1} nothing is reachable before mile {reach:.1}"
    )]
    FeasibilityUnreachable { position: f64, reach: f64 },
}

/// Choose fuel stops for a route of `total_distance` miles.
pub fn select_stops(
    candidates: &[CandidateStop],
    total_distance: f64,
    range_miles: f64,
    strategy: OptimizerStrategy,
) -> Result<Vec<usize>, OptimizeError> {
    match strategy {
        OptimizerStrategy::Greedy => greedy(candidates, total_distance, range_miles),
        OptimizerStrategy::MinCost => min_cost(candidates, total_distance, range_miles),
    }
}

/// Cheapest reachable stop with one-step lookahead.
///
/// From the current fill, consider every candidate in
/// `(position, position + range]` that can itself reach another candidate or
/// the destination. Take the cheapest, preferring the farthest on a price
/// tie, and repeat until the destination is within range.
pub fn greedy(
    candidates: &[CandidateStop],
    total_distance: f64,
    range_miles: f64,
) -> Result<Vec<usize>, OptimizeError> {
    let mut stops = Vec::new();
    let mut position = 0.0;

    while position + range_miles < total_distance {
        let reach = position + range_miles;

        let reachable = window(candidates, position, reach);
        if reachable.is_empty() {
            return Err(OptimizeError::FeasibilityUnreachable { position, reach });
        }

        let mut chosen: Option<usize> = None;
        for i in reachable.clone() {
            let c = &candidates[i];
            if !can_continue(candidates, i, total_distance, range_miles) {
                continue;
            }
            let better = match chosen {
                None => true,
                Some(j) => {
                    let best = &candidates[j];
                    c.price < best.price
                        || (c.price == best.price
                            && c.distance_from_start > best.distance_from_start)
                }
            };
            if better {
                chosen = Some(i);
            }
        }

        let Some(chosen) = chosen else {
            // Every reachable stop is a dead end.
            let last = &candidates[reachable.end - 1];
            return Err(OptimizeError::FeasibilityUnreachable {
                position: last.distance_from_start,
                reach: last.distance_from_start + range_miles,
            });
        };

        stops.push(chosen);
        position = candidates[chosen].distance_from_start;
    }

    Ok(stops)
}

/// Whether a fill at candidate `i` can reach the destination or another
/// candidate farther along.
fn can_continue(
    candidates: &[CandidateStop],
    i: usize,
    total_distance: f64,
    range_miles: f64,
) -> bool {
    let here = candidates[i].distance_from_start;
    let reach = here + range_miles;
    reach >= total_distance || !window(candidates, here, reach).is_empty()
}

/// Best known way to finish the trip after filling at a node.
#[derive(Debug, Clone, Copy)]
struct Tail {
    /// Sum of price times miles until the destination.
    cost: f64,
    stops: usize,
    /// Next node on the path; `None` means drive straight to the destination.
    next: Option<usize>,
}

fn cost_cmp(a: f64, b: f64) -> Ordering {
    let tolerance = COST_EPSILON * a.abs().max(b.abs()).max(1.0);
    if (a - b).abs() <= tolerance {
        Ordering::Equal
    } else {
        a.total_cmp(&b)
    }
}

/// Exact minimum-cost stop sequence.
///
/// Dynamic programming over candidates from the destination backwards:
/// `tail[i]` is the cheapest way to finish after filling at candidate `i`.
/// Equal costs prefer fewer stops, then the farther next stop.
pub fn min_cost(
    candidates: &[CandidateStop],
    total_distance: f64,
    range_miles: f64,
) -> Result<Vec<usize>, OptimizeError> {
    let n = candidates.len();
    let mut tails: Vec<Option<Tail>> = vec![None; n];

    for i in (0..n).rev() {
        let here = candidates[i].distance_from_start;
        let price = candidates[i].price;
        tails[i] = best_tail(candidates, &tails, i + 1, here, total_distance, range_miles, price);
    }

    // The starting tank is already paid for.
    let start = best_tail(candidates, &tails, 0, 0.0, total_distance, range_miles, 0.0);

    let Some(start) = start else {
        let position = farthest_reachable(candidates, range_miles);
        return Err(OptimizeError::FeasibilityUnreachable {
            position,
            reach: position + range_miles,
        });
    };

    let mut stops = Vec::with_capacity(start.stops);
    let mut cursor = start.next;
    while let Some(i) = cursor {
        stops.push(i);
        cursor = tails[i].and_then(|t| t.next);
    }
    Ok(stops)
}

/// Cheapest way to finish from a fill at `here` bought at `price`, choosing
/// among candidates from index `from` onwards and the destination itself.
fn best_tail(
    candidates: &[CandidateStop],
    tails: &[Option<Tail>],
    from: usize,
    here: f64,
    total_distance: f64,
    range_miles: f64,
    price: f64,
) -> Option<Tail> {
    let reach = here + range_miles;
    let mut best: Option<Tail> = None;

    if total_distance <= reach {
        best = Some(Tail {
            cost: price * (total_distance - here),
            stops: 0,
            next: None,
        });
    }

    // Later indices are never nearer, so replacing on a full tie keeps the
    // farther next stop.
    for j in from..candidates.len() {
        let there = candidates[j].distance_from_start;
        if there > reach {
            break;
        }
        let Some(tail) = tails[j] else {
            continue;
        };
        let option = Tail {
            cost: price * (there - here) + tail.cost,
            stops: tail.stops + 1,
            next: Some(j),
        };
        if best.is_none_or(|current| replaces(&option, &current)) {
            best = Some(option);
        }
    }

    best
}

/// Cheaper wins; equal costs prefer fewer stops, and a full tie goes to
/// the option considered later.
fn replaces(option: &Tail, current: &Tail) -> bool {
    match cost_cmp(option.cost, current.cost) {
        Ordering::Less => true,
        Ordering::Greater => false,
        Ordering::Equal => option.stops <= current.stops,
    }
}

/// Farthest fill position reachable from the start by any chain of stops.
fn farthest_reachable(candidates: &[CandidateStop], range_miles: f64) -> f64 {
    let mut frontier = 0.0_f64;
    for c in candidates {
        if c.distance_from_start > frontier + range_miles {
            break;
        }
        frontier = frontier.max(c.distance_from_start);
    }
    frontier
}
