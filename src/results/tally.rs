// Vote tallying for list-based (plurality) school elections

use crate::database::{ListVoteCount, VoteTotals};
use serde::Serialize;

/// One candidate list's line in the results table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListResult {
    pub list_id: i64,
    pub name: String,
    pub votes: i64,
    pub percentage: f64,
    pub is_winner: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Winner {
    pub list_id: i64,
    pub name: String,
    pub votes: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct VoteShare {
    pub votes: i64,
    pub percentage: f64,
}

/// Aggregate outcome of one election process
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tally {
    pub lists: Vec<ListResult>,
    pub winner: Option<Winner>,
    pub blank: VoteShare,
    pub null: VoteShare,
    pub total_votes: i64,
    pub eligible_voters: i64,
    pub not_voted: i64,
    pub participation_percentage: f64,
}

/// `part` as a percentage of `whole`; 0 when there is nothing to divide by.
pub fn percentage(part: i64, whole: i64) -> f64 {
    if whole > 0 {
        part as f64 / whole as f64 * 100.0
    } else {
        0.0
    }
}

/// Build the results from list counts that are already sorted by votes, descending.
///
/// A list becomes the winner only when its count is strictly greater than the
/// running maximum, so among tied lists the first one seen keeps the flag and a
/// list with zero votes never wins.
pub fn tally(counts: &[ListVoteCount], totals: VoteTotals, eligible_voters: i64) -> Tally {
    let mut lists: Vec<ListResult> = Vec::with_capacity(counts.len());
    let mut winner: Option<Winner> = None;
    let mut max_votes = 0;

    for count in counts {
        let mut result = ListResult {
            list_id: count.list_id,
            name: count.list_name.clone(),
            votes: count.votes,
            percentage: percentage(count.votes, totals.total),
            is_winner: false,
        };

        if count.votes > max_votes {
            max_votes = count.votes;
            for previous in lists.iter_mut() {
                previous.is_winner = false;
            }
            result.is_winner = true;
            winner = Some(Winner {
                list_id: count.list_id,
                name: count.list_name.clone(),
                votes: count.votes,
            });
        }

        lists.push(result);
    }

    Tally {
        lists,
        winner,
        blank: VoteShare {
            votes: totals.blank,
            percentage: percentage(totals.blank, totals.total),
        },
        null: VoteShare {
            votes: totals.null_votes,
            percentage: percentage(totals.null_votes, totals.total),
        },
        total_votes: totals.total,
        eligible_voters,
        not_voted: (eligible_voters - totals.total).max(0),
        participation_percentage: percentage(totals.total, eligible_voters),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn count(list_id: i64, name: &str, votes: i64) -> ListVoteCount {
        ListVoteCount {
            list_id,
            list_name: name.to_string(),
            votes,
        }
    }

    fn totals(total: i64, blank: i64, null_votes: i64) -> VoteTotals {
        VoteTotals {
            total,
            blank,
            null_votes,
        }
    }

    fn winners(tally: &Tally) -> Vec<&str> {
        tally
            .lists
            .iter()
            .filter(|l| l.is_winner)
            .map(|l| l.name.as_str())
            .collect()
    }

    #[test]
    fn reference_distribution() {
        let result = tally(
            &[count(2, "B", 45), count(1, "A", 30)],
            totals(100, 10, 15),
            120,
        );

        assert_eq!(winners(&result), vec!["B"]);
        assert_eq!(
            result.winner,
            Some(Winner {
                list_id: 2,
                name: "B".to_string(),
                votes: 45
            })
        );
        assert_eq!(result.lists[0].percentage, 45.0);
        assert_eq!(result.lists[1].percentage, 30.0);
        assert_eq!(result.blank.percentage, 10.0);
        assert_eq!(result.null.percentage, 15.0);

        let sum: f64 = result.lists.iter().map(|l| l.percentage).sum::<f64>()
            + result.blank.percentage
            + result.null.percentage;
        assert!((sum - 100.0).abs() < 1e-9);
    }

    #[rstest]
    #[case(vec![7, 5, 3], 2, 1)]
    #[case(vec![1, 1, 1], 0, 0)]
    #[case(vec![33], 1, 0)]
    #[case(vec![10, 9, 8, 7, 6, 5], 4, 3)]
    fn percentages_sum_to_one_hundred(
        #[case] list_votes: Vec<i64>,
        #[case] blank: i64,
        #[case] null_votes: i64,
    ) {
        let counts: Vec<_> = list_votes
            .iter()
            .enumerate()
            .map(|(i, v)| count(i as i64 + 1, &format!("L{}", i + 1), *v))
            .collect();
        let total = list_votes.iter().sum::<i64>() + blank + null_votes;

        let result = tally(&counts, totals(total, blank, null_votes), total);
        let sum: f64 = result.lists.iter().map(|l| l.percentage).sum::<f64>()
            + result.blank.percentage
            + result.null.percentage;

        assert!((sum - 100.0).abs() < 1e-9, "sum was {}", sum);
        assert_eq!(winners(&result).len(), 1);
    }

    #[test]
    fn no_votes_means_zero_percentages_and_no_winner() {
        let result = tally(&[], totals(0, 0, 0), 25);

        assert!(result.lists.is_empty());
        assert_eq!(result.winner, None);
        assert_eq!(result.blank, VoteShare::default());
        assert_eq!(result.null, VoteShare::default());
        assert_eq!(result.participation_percentage, 0.0);
        assert_eq!(result.not_voted, 25);
    }

    #[test]
    fn only_blank_and_null_votes_leave_no_winner() {
        let result = tally(&[], totals(4, 3, 1), 10);

        assert_eq!(result.winner, None);
        assert_eq!(result.blank.percentage, 75.0);
        assert_eq!(result.null.percentage, 25.0);
    }

    #[test]
    fn first_of_tied_lists_keeps_the_win() {
        let result = tally(
            &[count(4, "Cuarta", 12), count(1, "Primera", 12), count(2, "Segunda", 3)],
            totals(27, 0, 0),
            30,
        );

        assert_eq!(winners(&result), vec!["Cuarta"]);
        assert_eq!(result.winner.map(|w| w.list_id), Some(4));
    }

    #[test]
    fn later_strictly_greater_count_takes_over() {
        // Unsorted input still honours the strict-greater rule
        let result = tally(
            &[count(1, "A", 2), count(2, "B", 5), count(3, "C", 5)],
            totals(12, 0, 0),
            12,
        );

        assert_eq!(winners(&result), vec!["B"]);
    }

    #[rstest]
    #[case(40, 50, 80.0)]
    #[case(0, 50, 0.0)]
    #[case(10, 0, 0.0)]
    fn participation(#[case] cast: i64, #[case] eligible: i64, #[case] expected: f64) {
        let result = tally(&[], totals(cast, cast, 0), eligible);
        assert_eq!(result.participation_percentage, expected);
    }

    #[test]
    fn non_voters_never_negative() {
        let result = tally(&[], totals(12, 12, 0), 10);
        assert_eq!(result.not_voted, 0);
    }
}
