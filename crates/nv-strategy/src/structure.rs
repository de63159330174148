use nv_schemas::Snapshot;

/// Output of the structure analyzer: a signed composite in `[-1, +1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureOutput {
    pub score: f64,
    pub rationale: Vec<String>,
}

impl StructureOutput {
    fn flat(reason: &str) -> Self {
        Self {
            score: 0.0,
            rationale: vec![reason.to_string()],
        }
    }
}

/// Price position against the VWAP bands, signed by direction and scaled by
/// how far outside the ±1σ band it sits (spec §4.8 step 1: "price on
/// correct side of VWAP and ±1σ band").
fn vwap_alignment(price: f64, vwap: f64, up1: f64, dn1: f64) -> f64 {
    if price >= up1 {
        1.0
    } else if price <= dn1 {
        -1.0
    } else if price >= vwap {
        let span = (up1 - vwap).max(1e-9);
        (price - vwap) / span
    } else {
        let span = (vwap - dn1).max(1e-9);
        (price - vwap) / span
    }
}

/// Price position inside (or outside) the current session's value area,
/// signed from the POC (spec §4.8 step 1: "VVA position").
fn vva_position(price: f64, vpoc: f64, vah: f64, val: f64) -> f64 {
    if price >= vah {
        1.0
    } else if price <= val {
        -1.0
    } else {
        let half_width = ((vah - val) / 2.0).max(1e-9);
        ((price - vpoc) / half_width).clamp(-1.0, 1.0)
    }
}

/// Composite structure score (spec §4.8 step 1): VWAP alignment, VVA
/// position, and ES/NQ correlation confirmation, each normalized to
/// `[-1, +1]` and averaged. Distinct from `BattleNavaleOutput::pattern_score`,
/// which scores candle/orderflow patterns rather than structure.
pub struct StructureAnalyzer;

impl StructureAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, snapshot: &Snapshot) -> StructureOutput {
        let mut parts = Vec::with_capacity(3);
        let mut rationale = Vec::new();

        if let Some(bands) = snapshot.vwap() {
            let a = vwap_alignment(snapshot.price, bands.vwap, bands.up1, bands.dn1);
            rationale.push(format!("vwap_alignment={a:.2}"));
            parts.push(a);
        }

        let vp = &snapshot.volume_profile;
        if let (Some(vpoc), Some(vah), Some(val)) = (vp.vpoc, vp.vah, vp.val) {
            let v = vva_position(snapshot.price, vpoc, vah, val);
            rationale.push(format!("vva_position={v:.2}"));
            parts.push(v);
        }

        let corr = snapshot.correlation_es_nq.clamp(-1.0, 1.0);
        rationale.push(format!("corr_es_nq={corr:.2}"));
        parts.push(corr);

        if parts.is_empty() {
            return StructureOutput::flat("no structure inputs available");
        }

        let score = (parts.iter().sum::<f64>() / parts.len() as f64).clamp(-1.0, 1.0);
        StructureOutput { score, rationale }
    }
}

impl Default for StructureAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
