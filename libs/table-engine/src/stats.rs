//! Summary statistics для карточек над таблицами.
//!
//! Считаются по полному набору записей (не по отфильтрованной странице).

use std::collections::BTreeSet;

use serde::Serialize;

use fello_api::{Fellow, Finder, Interaction};

use crate::facets::FacetCounts;
use crate::format::{humanize, is_short_interaction};

const CANCELLED: [&str; 3] = [
    "cancelled_by_admin",
    "cancelled_by_fello",
    "cancelled_by_participant",
];
const NO_SHOW: [&str; 2] = ["no_show_fello", "no_show_participant"];

fn has_status(status: &Option<String>, expected: &str) -> bool {
    status.as_deref() == Some(expected)
}

/// Числовой rating; метки bucket'ов (`new`, `1-3`) числом не считаются.
fn numeric_rating(rating: Option<&str>) -> Option<f64> {
    rating?.trim().parse::<f64>().ok().filter(|r| r.is_finite())
}

fn average(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, n) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 { 0.0 } else { sum / n as f64 }
}

/// Процент `part` от `total`; на пустом наборе: 0.
fn rate(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

// ════════════════════════════════════════════════════════════════
//  Fellows
// ════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FellowStats {
    pub total: usize,
    pub active: usize,
    /// Ждут проверки: background check или vertical'и на одобрении.
    pub pending_verification: usize,
    /// Deactivated или pending deletion.
    pub deactivated: usize,
    pub average_rating: f64,
    pub pending_stripe_setup: usize,
}

impl FellowStats {
    pub fn compute(fellows: &[Fellow]) -> Self {
        let count = |pred: fn(&Fellow) -> bool| fellows.iter().filter(|&f| pred(f)).count();

        Self {
            total: fellows.len(),
            active: count(|f: &Fellow| has_status(&f.status, "active")),
            pending_verification: count(|f: &Fellow| {
                has_status(&f.status, "background_check_required") || !f.verticals_for_approval.is_empty()
            }),
            deactivated: count(|f: &Fellow| {
                has_status(&f.status, "deactivated") || has_status(&f.status, "pending_deletion")
            }),
            average_rating: average(fellows.iter().filter_map(|f| numeric_rating(f.rating.as_deref()))),
            pending_stripe_setup: count(|f: &Fellow| !f.is_stripe_onboarding_complete),
        }
    }
}

// ════════════════════════════════════════════════════════════════
//  Finders
// ════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChallengeCount {
    pub challenge: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FinderStats {
    pub total: usize,
    pub active: usize,
    pub pending_deletion: usize,
    /// Среднее по числовым rating'ам; `new` не учитывается.
    pub average_rating: f64,
    pub challenge_breakdown: FacetCounts,
    /// Самый частый challenge (`_` → пробел); при равенстве: первый встреченный.
    pub most_common_challenge: Option<ChallengeCount>,
    /// Имя не `N/A`, есть gender, age > 0, challenges и фото.
    pub complete_profiles: usize,
}

impl FinderStats {
    pub fn compute(finders: &[Finder]) -> Self {
        let challenge_breakdown: FacetCounts = finders
            .iter()
            .flat_map(|f| f.challenges.iter())
            .map(|c| (c.as_str(), 1))
            .collect();

        let most_common_challenge = challenge_breakdown
            .iter()
            .fold(None::<(&str, usize)>, |best, (label, n)| match best {
                Some((_, top)) if top >= n => best,
                _ => Some((label, n)),
            })
            .map(|(label, count)| ChallengeCount {
                challenge: humanize(label),
                count,
            });

        Self {
            total: finders.len(),
            active: finders.iter().filter(|f| has_status(&f.status, "active")).count(),
            pending_deletion: finders
                .iter()
                .filter(|f| has_status(&f.status, "pending_deletion"))
                .count(),
            average_rating: average(finders.iter().filter_map(|f| numeric_rating(f.rating.as_deref()))),
            most_common_challenge,
            challenge_breakdown,
            complete_profiles: finders.iter().filter(|f| is_complete_profile(f)).count(),
        }
    }
}

fn is_complete_profile(finder: &Finder) -> bool {
    finder.name != "N/A"
        && finder.gender.is_some()
        && finder.age.is_some_and(|age| age > 0)
        && !finder.challenges.is_empty()
        && finder.photo_url.is_some()
}

// ════════════════════════════════════════════════════════════════
//  Interactions
// ════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InteractionStats {
    pub total: usize,
    pub completed: usize,
    pub upcoming: usize,
    pub escalated: usize,
    pub cancelled: usize,
    pub no_show: usize,
    pub pending_payments: usize,
    pub requires_review: usize,
    /// Проценты (0..=100), на пустом наборе: 0.
    pub completion_rate: f64,
    pub cancellation_rate: f64,
    pub no_show_rate: f64,
    /// Сумма actual_duration в минутах; отсутствующие считаются как 0.
    pub total_duration: f64,
    /// `total_duration / total`, округлено до минуты.
    pub average_duration: f64,
    pub fellos_with_upcoming: usize,
    pub finders_with_upcoming: usize,
    /// actual < 80% от scheduled.
    pub short_interactions: usize,
}

impl InteractionStats {
    pub fn compute(interactions: &[Interaction]) -> Self {
        let total = interactions.len();
        let completed = count_status(interactions, &["completed"]);
        let cancelled = count_status(interactions, &CANCELLED);
        let no_show = count_status(interactions, &NO_SHOW);

        let upcoming: Vec<&Interaction> = interactions
            .iter()
            .filter(|i| has_status(&i.interaction_status, "upcoming"))
            .collect();
        let fellos: BTreeSet<i64> = upcoming.iter().map(|i| i.fello_user_profile_id).collect();
        let finders: BTreeSet<i64> = upcoming.iter().map(|i| i.participant_user_profile_id).collect();

        let total_duration: f64 = interactions
            .iter()
            .map(|i| i.actual_duration.unwrap_or_default())
            .sum();

        Self {
            total,
            completed,
            upcoming: upcoming.len(),
            escalated: count_status(interactions, &["escalated"]),
            cancelled,
            no_show,
            pending_payments: interactions.iter().filter(|i| i.is_payment_pending).count(),
            requires_review: interactions
                .iter()
                .filter(|i| i.requires_review == Some(true))
                .count(),
            completion_rate: rate(completed, total),
            cancellation_rate: rate(cancelled, total),
            no_show_rate: rate(no_show, total),
            total_duration,
            average_duration: if total == 0 {
                0.0
            } else {
                (total_duration / total as f64).round()
            },
            fellos_with_upcoming: fellos.len(),
            finders_with_upcoming: finders.len(),
            short_interactions: interactions
                .iter()
                .filter(|i| is_short_interaction(i.duration, i.actual_duration))
                .count(),
        }
    }
}

fn count_status(interactions: &[Interaction], expected: &[&str]) -> usize {
    interactions
        .iter()
        .filter(|i| {
            i.interaction_status
                .as_deref()
                .is_some_and(|s| expected.contains(&s))
        })
        .count()
}

/// Stats одной сущности для API.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "entity", rename_all = "snake_case")]
pub enum EntityStats {
    Fellows(FellowStats),
    Finders(FinderStats),
    Interactions(InteractionStats),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fellow(status: &str, rating: Option<&str>, stripe: bool) -> Fellow {
        Fellow {
            status: Some(status.into()),
            rating: rating.map(String::from),
            is_stripe_onboarding_complete: stripe,
            ..Fellow::default()
        }
    }

    fn interaction(status: &str, duration: f64, actual: Option<f64>) -> Interaction {
        Interaction {
            interaction_status: Some(status.into()),
            duration,
            actual_duration: actual,
            ..Interaction::default()
        }
    }

    #[test]
    fn fellow_stats() {
        let mut pending = fellow("training_required", Some("new"), true);
        pending.verticals_for_approval = vec!["parenting".into()];
        let fellows = [
            fellow("active", Some("4.5"), true),
            fellow("active", Some("3.5"), false),
            fellow("background_check_required", None, false),
            fellow("pending_deletion", Some("1-3"), true),
            pending,
        ];
        let stats = FellowStats::compute(&fellows);
        assert_eq!(stats.total, 5);
        assert_eq!(stats.active, 2);
        assert_eq!(stats.pending_verification, 2);
        assert_eq!(stats.deactivated, 1);
        assert_eq!(stats.average_rating, 4.0);
        assert_eq!(stats.pending_stripe_setup, 2);
    }

    #[test]
    fn empty_sets_have_zero_rates() {
        assert_eq!(FellowStats::compute(&[]).average_rating, 0.0);
        let stats = InteractionStats::compute(&[]);
        assert_eq!(stats.completion_rate, 0.0);
        assert_eq!(stats.cancellation_rate, 0.0);
        assert_eq!(stats.average_duration, 0.0);
        assert!(FinderStats::compute(&[]).most_common_challenge.is_none());
    }

    #[test]
    fn finder_stats() {
        let complete = Finder {
            name: "Kim".into(),
            gender: Some("female".into()),
            age: Some(29),
            challenges: vec!["alcohol_use".into(), "parenting".into()],
            photo_url: Some("https://img/kim.png".into()),
            status: Some("active".into()),
            rating: Some("4".into()),
            ..Finder::default()
        };
        let anonymous = Finder {
            name: "N/A".into(),
            challenges: vec!["alcohol_use".into()],
            status: Some("pending_deletion".into()),
            rating: Some("new".into()),
            ..complete.clone()
        };
        let stats = FinderStats::compute(&[complete, anonymous]);

        assert_eq!(stats.active, 1);
        assert_eq!(stats.pending_deletion, 1);
        assert_eq!(stats.average_rating, 4.0);
        assert_eq!(stats.complete_profiles, 1);
        assert_eq!(stats.challenge_breakdown.get("alcohol_use"), 2);
        assert_eq!(
            stats.most_common_challenge,
            Some(ChallengeCount {
                challenge: "alcohol use".into(),
                count: 2
            })
        );
    }

    #[test]
    fn interaction_stats() {
        let mut upcoming_a = interaction("upcoming", 30.0, None);
        upcoming_a.fello_user_profile_id = 1;
        upcoming_a.participant_user_profile_id = 10;
        let mut upcoming_b = upcoming_a.clone();
        upcoming_b.participant_user_profile_id = 11;

        let mut paid = interaction("completed", 60.0, Some(40.0));
        paid.is_payment_pending = true;
        paid.requires_review = Some(true);

        let interactions = [
            paid,
            interaction("completed", 60.0, Some(60.0)),
            interaction("cancelled_by_fello", 30.0, None),
            interaction("no_show_participant", 30.0, None),
            upcoming_a,
            upcoming_b,
            interaction("escalated", 45.0, Some(20.0)),
            interaction("", 45.0, None),
        ];
        let stats = InteractionStats::compute(&interactions);

        assert_eq!(stats.total, 8);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.upcoming, 2);
        assert_eq!(stats.escalated, 1);
        assert_eq!(stats.cancelled, 1);
        assert_eq!(stats.no_show, 1);
        assert_eq!(stats.pending_payments, 1);
        assert_eq!(stats.requires_review, 1);
        assert_eq!(stats.completion_rate, 25.0);
        assert_eq!(stats.cancellation_rate, 12.5);
        assert_eq!(stats.total_duration, 120.0);
        assert_eq!(stats.average_duration, 15.0);
        assert_eq!(stats.fellos_with_upcoming, 1);
        assert_eq!(stats.finders_with_upcoming, 2);
        assert_eq!(stats.short_interactions, 2);
    }
}
