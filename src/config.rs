use crate::errors::{CoreError, CoreResult};

/// The merit formula used to rank candidate links, see [`crate::processes::merit_ranker`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchType {
    Nshared,
    NsharedN1,
    NsharedN1N2,
    Nsharedcombo,
}

/// Multi-step candidate-list merge policy, see [`crate::processes::multi_step_reconciler`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkPolicy {
    Missing,
    Merit,
}

/// Every external knob the core needs, validated once at construction time rather than
/// smuggled in as loose primitives (`matchtype`/`ilink` being plain enums already closes off
/// the unknown-discriminant class of `PolicyViolation`; what remains to validate here is
/// `mlsig`).
#[derive(Clone, Debug)]
pub struct MatchOptions {
    pub mlsig: f64,
    pub matchtype: MatchType,
    pub ilink: LinkPolicy,
    pub haloidval: u64,
    pub snapshotvaloffset: i64,
    pub haloidoffset: u64,
    pub num_part: u64,
    pub num_snapshots: usize,
}

impl MatchOptions {
    pub fn builder() -> MatchOptionsBuilder {
        MatchOptionsBuilder::default()
    }
}

#[derive(Default)]
pub struct MatchOptionsBuilder {
    mlsig: Option<f64>,
    matchtype: Option<MatchType>,
    ilink: Option<LinkPolicy>,
    haloidval: Option<u64>,
    snapshotvaloffset: i64,
    haloidoffset: u64,
    num_part: Option<u64>,
    num_snapshots: Option<usize>,
}

impl MatchOptionsBuilder {
    pub fn mlsig(mut self, mlsig: f64) -> Self {
        self.mlsig = Some(mlsig);
        self
    }

    pub fn matchtype(mut self, matchtype: MatchType) -> Self {
        self.matchtype = Some(matchtype);
        self
    }

    pub fn ilink(mut self, ilink: LinkPolicy) -> Self {
        self.ilink = Some(ilink);
        self
    }

    pub fn haloidval(mut self, haloidval: u64) -> Self {
        self.haloidval = Some(haloidval);
        self
    }

    pub fn snapshotvaloffset(mut self, offset: i64) -> Self {
        self.snapshotvaloffset = offset;
        self
    }

    pub fn haloidoffset(mut self, offset: u64) -> Self {
        self.haloidoffset = offset;
        self
    }

    pub fn num_part(mut self, num_part: u64) -> Self {
        self.num_part = Some(num_part);
        self
    }

    pub fn num_snapshots(mut self, num_snapshots: usize) -> Self {
        self.num_snapshots = Some(num_snapshots);
        self
    }

    pub fn build(self) -> CoreResult<MatchOptions> {
        let mlsig = self.mlsig.unwrap_or(0.0);
        if mlsig < 0.0 {
            return Err(CoreError::PolicyViolation(format!("mlsig must be >= 0.0, got {mlsig}")));
        }
        let num_part = self
            .num_part
            .ok_or_else(|| CoreError::PolicyViolation("num_part is required".to_string()))?;
        let num_snapshots = self
            .num_snapshots
            .ok_or_else(|| CoreError::PolicyViolation("num_snapshots is required".to_string()))?;
        Ok(MatchOptions {
            mlsig,
            matchtype: self.matchtype.unwrap_or(MatchType::NsharedN1N2),
            ilink: self.ilink.unwrap_or(LinkPolicy::Merit),
            haloidval: self.haloidval.unwrap_or(0),
            snapshotvaloffset: self.snapshotvaloffset,
            haloidoffset: self.haloidoffset,
            num_part,
            num_snapshots,
        })
    }
}
