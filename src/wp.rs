//! Working-point enumerations and the flat-key encodings of their
//! combinations.
//!
//! Every index table in the crate is keyed by an ordered tuple of
//! working-point tiers. Each tuple shape gets its own key struct with a
//! bijective `encode`/`decode` pair over a mixed-radix integer, so the
//! arithmetic lives here and nowhere else. Field order within a key is
//! fixed and most-significant first; the table domains are small enough
//! that every encoding is exercised exhaustively by the tests below.

use std::fmt;

use itertools::iproduct;
use serde::{Deserialize, Serialize};

/// Lepton identification tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LepId {
    Loose = 0,
    Tight = 1,
}

impl LepId {
    pub const COUNT: usize = 2;
    pub const ALL: [LepId; Self::COUNT] = [LepId::Loose, LepId::Tight];

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(LepId::Loose),
            1 => Some(LepId::Tight),
            _ => None,
        }
    }

    /// Short code used in human-readable cell labels.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            LepId::Loose => "L",
            LepId::Tight => "T",
        }
    }
}

/// Lepton isolation tier. `None` means no isolation requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LepIso {
    None = 0,
    Loose = 1,
    Tight = 2,
}

impl LepIso {
    pub const COUNT: usize = 3;
    pub const ALL: [LepIso; Self::COUNT] = [LepIso::None, LepIso::Loose, LepIso::Tight];

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(LepIso::None),
            1 => Some(LepIso::Loose),
            2 => Some(LepIso::Tight),
            _ => None,
        }
    }

    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            LepIso::None => "no",
            LepIso::Loose => "L",
            LepIso::Tight => "T",
        }
    }
}

/// Jet identification tier. `None` means no jet-ID requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JetId {
    Loose = 0,
    Tight = 1,
    TightLeptonVeto = 2,
    None = 3,
}

impl JetId {
    pub const COUNT: usize = 4;
    pub const ALL: [JetId; Self::COUNT] = [
        JetId::Loose,
        JetId::Tight,
        JetId::TightLeptonVeto,
        JetId::None,
    ];

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(JetId::Loose),
            1 => Some(JetId::Tight),
            2 => Some(JetId::TightLeptonVeto),
            3 => Some(JetId::None),
            _ => None,
        }
    }

    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            JetId::Loose => "L",
            JetId::Tight => "T",
            JetId::TightLeptonVeto => "TLV",
            JetId::None => "no",
        }
    }
}

/// b-tagging working point. `None` means no b-tag requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BtagWp {
    None = 0,
    Loose = 1,
    Medium = 2,
    Tight = 3,
}

impl BtagWp {
    pub const COUNT: usize = 4;
    pub const ALL: [BtagWp; Self::COUNT] = [
        BtagWp::None,
        BtagWp::Loose,
        BtagWp::Medium,
        BtagWp::Tight,
    ];

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(BtagWp::None),
            1 => Some(BtagWp::Loose),
            2 => Some(BtagWp::Medium),
            3 => Some(BtagWp::Tight),
            _ => None,
        }
    }

    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            BtagWp::None => "no",
            BtagWp::Loose => "L",
            BtagWp::Medium => "M",
            BtagWp::Tight => "T",
        }
    }
}

/// Ranking criterion for jet-pair index slices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PairRank {
    /// Construction order: pairs of leading jets first.
    Ht = 0,
    /// Ascending distance of the pair mass to the configured target mass.
    Mh = 1,
    /// Descending pair transverse momentum.
    Pt = 2,
    /// Descending summed first discriminant.
    SumCsv = 3,
    /// Descending summed second discriminant.
    SumJp = 4,
    /// Descending pair pT over pair mass.
    PtOverM = 5,
}

impl PairRank {
    pub const COUNT: usize = 6;
    pub const ALL: [PairRank; Self::COUNT] = [
        PairRank::Ht,
        PairRank::Mh,
        PairRank::Pt,
        PairRank::SumCsv,
        PairRank::SumJp,
        PairRank::PtOverM,
    ];

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(PairRank::Ht),
            1 => Some(PairRank::Mh),
            2 => Some(PairRank::Pt),
            3 => Some(PairRank::SumCsv),
            4 => Some(PairRank::SumJp),
            5 => Some(PairRank::PtOverM),
            _ => None,
        }
    }

    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            PairRank::Ht => "ht",
            PairRank::Mh => "mh",
            PairRank::Pt => "pt",
            PairRank::SumCsv => "csv",
            PairRank::SumJp => "jp",
            PairRank::PtOverM => "ptOverM",
        }
    }
}

impl fmt::Display for LepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl fmt::Display for LepIso {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl fmt::Display for JetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl fmt::Display for BtagWp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl fmt::Display for PairRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A flat-encodable key into an index table.
pub trait FlatKey: Copy + fmt::Display {
    /// Number of distinct keys, i.e. the table size.
    const DOMAIN: usize;

    /// Bijective mapping of this key into `0..DOMAIN`.
    fn encode(self) -> usize;

    /// Exact inverse of [`encode`](FlatKey::encode); `None` outside the
    /// domain.
    fn decode(raw: usize) -> Option<Self>;
}

/// Selection key for a single lepton: (id, iso).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LepKey {
    pub id: LepId,
    pub iso: LepIso,
}

impl LepKey {
    #[must_use]
    pub fn all() -> impl Iterator<Item = Self> {
        iproduct!(LepId::ALL, LepIso::ALL).map(|(id, iso)| Self { id, iso })
    }
}

impl FlatKey for LepKey {
    const DOMAIN: usize = LepId::COUNT * LepIso::COUNT;

    fn encode(self) -> usize {
        self.id.index() * LepIso::COUNT + self.iso.index()
    }

    fn decode(raw: usize) -> Option<Self> {
        if raw >= Self::DOMAIN {
            return None;
        }
        Some(Self {
            id: LepId::from_index(raw / LepIso::COUNT)?,
            iso: LepIso::from_index(raw % LepIso::COUNT)?,
        })
    }
}

impl fmt::Display for LepKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.id, self.iso)
    }
}

/// Selection key for a lepton pair: (id1, iso1, id2, iso2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DilepKey {
    pub id1: LepId,
    pub iso1: LepIso,
    pub id2: LepId,
    pub iso2: LepIso,
}

impl DilepKey {
    #[must_use]
    pub fn all() -> impl Iterator<Item = Self> {
        iproduct!(LepId::ALL, LepIso::ALL, LepId::ALL, LepIso::ALL)
            .map(|(id1, iso1, id2, iso2)| Self {
                id1,
                iso1,
                id2,
                iso2,
            })
    }
}

impl FlatKey for DilepKey {
    const DOMAIN: usize =
        LepId::COUNT * LepIso::COUNT * LepId::COUNT * LepIso::COUNT;

    fn encode(self) -> usize {
        ((self.id1.index() * LepIso::COUNT + self.iso1.index()) * LepId::COUNT
            + self.id2.index())
            * LepIso::COUNT
            + self.iso2.index()
    }

    fn decode(raw: usize) -> Option<Self> {
        if raw >= Self::DOMAIN {
            return None;
        }
        let iso2 = raw % LepIso::COUNT;
        let rest = raw / LepIso::COUNT;
        let id2 = rest % LepId::COUNT;
        let rest = rest / LepId::COUNT;
        let iso1 = rest % LepIso::COUNT;
        let id1 = rest / LepIso::COUNT;
        Some(Self {
            id1: LepId::from_index(id1)?,
            iso1: LepIso::from_index(iso1)?,
            id2: LepId::from_index(id2)?,
            iso2: LepIso::from_index(iso2)?,
        })
    }
}

impl fmt::Display for DilepKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}_{}", self.id1, self.iso1, self.id2, self.iso2)
    }
}

/// Selection key for a single jet: (id, btag).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JetKey {
    pub id: JetId,
    pub btag: BtagWp,
}

impl JetKey {
    #[must_use]
    pub fn all() -> impl Iterator<Item = Self> {
        iproduct!(JetId::ALL, BtagWp::ALL).map(|(id, btag)| Self { id, btag })
    }
}

impl FlatKey for JetKey {
    const DOMAIN: usize = JetId::COUNT * BtagWp::COUNT;

    fn encode(self) -> usize {
        self.id.index() * BtagWp::COUNT + self.btag.index()
    }

    fn decode(raw: usize) -> Option<Self> {
        if raw >= Self::DOMAIN {
            return None;
        }
        Some(Self {
            id: JetId::from_index(raw / BtagWp::COUNT)?,
            btag: BtagWp::from_index(raw % BtagWp::COUNT)?,
        })
    }
}

impl fmt::Display for JetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.id, self.btag)
    }
}

/// Selection key for a jet pair: (id1, id2, btag1, btag2, rank).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DijetKey {
    pub id1: JetId,
    pub id2: JetId,
    pub btag1: BtagWp,
    pub btag2: BtagWp,
    pub rank: PairRank,
}

impl DijetKey {
    #[must_use]
    pub fn all() -> impl Iterator<Item = Self> {
        iproduct!(
            JetId::ALL,
            JetId::ALL,
            BtagWp::ALL,
            BtagWp::ALL,
            PairRank::ALL
        )
        .map(|(id1, id2, btag1, btag2, rank)| Self {
            id1,
            id2,
            btag1,
            btag2,
            rank,
        })
    }

    /// The same cell under the baseline (construction-order) ranking.
    #[must_use]
    pub fn with_rank(self, rank: PairRank) -> Self {
        Self { rank, ..self }
    }
}

impl FlatKey for DijetKey {
    const DOMAIN: usize =
        JetId::COUNT * JetId::COUNT * BtagWp::COUNT * BtagWp::COUNT * PairRank::COUNT;

    fn encode(self) -> usize {
        (((self.id1.index() * JetId::COUNT + self.id2.index()) * BtagWp::COUNT
            + self.btag1.index())
            * BtagWp::COUNT
            + self.btag2.index())
            * PairRank::COUNT
            + self.rank.index()
    }

    fn decode(raw: usize) -> Option<Self> {
        if raw >= Self::DOMAIN {
            return None;
        }
        let rank = raw % PairRank::COUNT;
        let rest = raw / PairRank::COUNT;
        let btag2 = rest % BtagWp::COUNT;
        let rest = rest / BtagWp::COUNT;
        let btag1 = rest % BtagWp::COUNT;
        let rest = rest / BtagWp::COUNT;
        let id2 = rest % JetId::COUNT;
        let id1 = rest / JetId::COUNT;
        Some(Self {
            id1: JetId::from_index(id1)?,
            id2: JetId::from_index(id2)?,
            btag1: BtagWp::from_index(btag1)?,
            btag2: BtagWp::from_index(btag2)?,
            rank: PairRank::from_index(rank)?,
        })
    }
}

impl fmt::Display for DijetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}_{}",
            self.id1, self.id2, self.btag1, self.btag2, self.rank
        )
    }
}

/// Selection key for a full dilepton+MET+dijet candidate:
/// (lep1 id, lep1 iso, lep2 id, lep2 iso, jet1 id, jet2 id, btag1, btag2,
/// rank), most-significant first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuadKey {
    pub lep1_id: LepId,
    pub lep1_iso: LepIso,
    pub lep2_id: LepId,
    pub lep2_iso: LepIso,
    pub jet1_id: JetId,
    pub jet2_id: JetId,
    pub btag1: BtagWp,
    pub btag2: BtagWp,
    pub rank: PairRank,
}

impl QuadKey {
    #[must_use]
    pub fn all() -> impl Iterator<Item = Self> {
        iproduct!(
            DilepKey::all(),
            JetId::ALL,
            JetId::ALL,
            BtagWp::ALL,
            BtagWp::ALL,
            PairRank::ALL
        )
        .map(|(ll, jet1_id, jet2_id, btag1, btag2, rank)| Self {
            lep1_id: ll.id1,
            lep1_iso: ll.iso1,
            lep2_id: ll.id2,
            lep2_iso: ll.iso2,
            jet1_id,
            jet2_id,
            btag1,
            btag2,
            rank,
        })
    }

    /// The dilepton+MET part of this key.
    #[must_use]
    pub fn dilepton_part(self) -> DilepKey {
        DilepKey {
            id1: self.lep1_id,
            iso1: self.lep1_iso,
            id2: self.lep2_id,
            iso2: self.lep2_iso,
        }
    }

    /// The dijet part of this key.
    #[must_use]
    pub fn dijet_part(self) -> DijetKey {
        DijetKey {
            id1: self.jet1_id,
            id2: self.jet2_id,
            btag1: self.btag1,
            btag2: self.btag2,
            rank: self.rank,
        }
    }

    /// Assemble a full key from its two source-table parts.
    #[must_use]
    pub fn from_parts(ll: DilepKey, jj: DijetKey) -> Self {
        Self {
            lep1_id: ll.id1,
            lep1_iso: ll.iso1,
            lep2_id: ll.id2,
            lep2_iso: ll.iso2,
            jet1_id: jj.id1,
            jet2_id: jj.id2,
            btag1: jj.btag1,
            btag2: jj.btag2,
            rank: jj.rank,
        }
    }
}

impl FlatKey for QuadKey {
    const DOMAIN: usize = DilepKey::DOMAIN * DijetKey::DOMAIN;

    fn encode(self) -> usize {
        self.dilepton_part().encode() * DijetKey::DOMAIN + self.dijet_part().encode()
    }

    fn decode(raw: usize) -> Option<Self> {
        if raw >= Self::DOMAIN {
            return None;
        }
        let ll = DilepKey::decode(raw / DijetKey::DOMAIN)?;
        let jj = DijetKey::decode(raw % DijetKey::DOMAIN)?;
        Some(Self::from_parts(ll, jj))
    }
}

impl fmt::Display for QuadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.dilepton_part(), self.dijet_part())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn assert_bijective<K>(all: impl Iterator<Item = K>)
    where
        K: FlatKey + PartialEq + std::fmt::Debug,
    {
        let mut seen = HashSet::new();
        let mut count = 0;
        for key in all {
            let raw = key.encode();
            assert!(raw < K::DOMAIN, "{key} encodes out of domain: {raw}");
            assert!(seen.insert(raw), "collision at {raw} for {key}");
            assert_eq!(K::decode(raw), Some(key));
            count += 1;
        }
        assert_eq!(count, K::DOMAIN);
        assert!(K::decode(K::DOMAIN).is_none());
    }

    #[test]
    fn test_lep_key_roundtrip() {
        assert_bijective(LepKey::all());
        assert_eq!(LepKey::DOMAIN, 6);
    }

    #[test]
    fn test_dilep_key_roundtrip() {
        assert_bijective(DilepKey::all());
        assert_eq!(DilepKey::DOMAIN, 36);
    }

    #[test]
    fn test_jet_key_roundtrip() {
        assert_bijective(JetKey::all());
        assert_eq!(JetKey::DOMAIN, 16);
    }

    #[test]
    fn test_dijet_key_roundtrip() {
        assert_bijective(DijetKey::all());
        assert_eq!(DijetKey::DOMAIN, 1536);
    }

    #[test]
    fn test_quad_key_roundtrip() {
        assert_bijective(QuadKey::all());
        assert_eq!(QuadKey::DOMAIN, 27_648);
    }

    #[test]
    fn test_quad_key_splits_into_parts() {
        for key in QuadKey::all() {
            assert_eq!(QuadKey::from_parts(key.dilepton_part(), key.dijet_part()), key);
        }
    }

    #[test]
    fn test_field_order_is_most_significant_first() {
        // Bumping the most-significant field moves the encoding by the
        // product of all lower radices.
        let base = QuadKey {
            lep1_id: LepId::Loose,
            lep1_iso: LepIso::None,
            lep2_id: LepId::Loose,
            lep2_iso: LepIso::None,
            jet1_id: JetId::Loose,
            jet2_id: JetId::Loose,
            btag1: BtagWp::None,
            btag2: BtagWp::None,
            rank: PairRank::Ht,
        };
        let bumped = QuadKey {
            lep1_id: LepId::Tight,
            ..base
        };
        assert_eq!(bumped.encode() - base.encode(), QuadKey::DOMAIN / LepId::COUNT);
    }

    #[test]
    fn test_labels() {
        let key = QuadKey {
            lep1_id: LepId::Tight,
            lep1_iso: LepIso::Tight,
            lep2_id: LepId::Tight,
            lep2_iso: LepIso::Tight,
            jet1_id: JetId::Tight,
            jet2_id: JetId::Tight,
            btag1: BtagWp::Loose,
            btag2: BtagWp::Loose,
            rank: PairRank::Ht,
        };
        assert_eq!(key.to_string(), "T_T_T_T_T_T_L_L_ht");
        assert_eq!(JetId::TightLeptonVeto.to_string(), "TLV");
        assert_eq!(LepIso::None.to_string(), "no");
    }
}
