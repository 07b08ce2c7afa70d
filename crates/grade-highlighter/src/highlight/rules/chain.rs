use super::RuleKey;
use crate::highlight::record::GradeRecord;

/// Totals one below a passing cluster boundary.
pub(crate) const BORDERLINE_TOTALS: [u64; 7] = [64, 69, 74, 79, 84, 89, 94];
/// Totals two below the boundary; the softer borderline tier.
pub(crate) const BORDERLINE_SECONDARY_TOTALS: [u64; 7] = [63, 68, 73, 78, 83, 88, 93];

pub(crate) struct RuleDefinition {
    pub(crate) key: RuleKey,
    pub(crate) predicate: fn(&GradeRecord) -> bool,
}

/// Rules in priority order; the first firing entry is the active one.
pub(crate) const RULE_CHAIN: [RuleDefinition; 7] = [
    RuleDefinition {
        key: RuleKey::Borderline,
        predicate: borderline,
    },
    RuleDefinition {
        key: RuleKey::EqualTo59,
        predicate: equal_to_59,
    },
    RuleDefinition {
        key: RuleKey::BorderlineSecondary,
        predicate: borderline_secondary,
    },
    RuleDefinition {
        key: RuleKey::Between55And59,
        predicate: between_55_and_59,
    },
    RuleDefinition {
        key: RuleKey::Between50And54,
        predicate: between_50_and_54,
    },
    RuleDefinition {
        key: RuleKey::IncompleteOrContinuing,
        predicate: incomplete_or_continuing,
    },
    RuleDefinition {
        key: RuleKey::FinalMarkZero,
        predicate: final_mark_zero,
    },
];

fn borderline(record: &GradeRecord) -> bool {
    record.total_is_one_of(&BORDERLINE_TOTALS)
}

fn equal_to_59(record: &GradeRecord) -> bool {
    record.total_mark == Some(59) && !record.is_absent()
}

fn borderline_secondary(record: &GradeRecord) -> bool {
    record.total_is_one_of(&BORDERLINE_SECONDARY_TOTALS)
}

fn between_55_and_59(record: &GradeRecord) -> bool {
    record.total_in(55, 59) && !record.is_absent()
}

fn between_50_and_54(record: &GradeRecord) -> bool {
    record.total_in(50, 54) && !record.is_absent()
}

fn incomplete_or_continuing(record: &GradeRecord) -> bool {
    record.is_incomplete_or_continuing()
}

fn final_mark_zero(record: &GradeRecord) -> bool {
    record.final_mark == Some(0) && !record.is_absent()
}
