use super::{
    AtomSlot, BundleAtom, BundleCheck, BundleCrowd, BundleForce, BundleRange, BundleValue,
    LocusParams, Periodic,
};
use crate::fleet::registry::{ConfigError, ParamRegistry};

/// Builds bundle configuration from a registry, handing out one jitter slot
/// per atom.
///
/// Missing keys resolve to neutral values: 0 for numbers, a constant value
/// type, and `never` for checks.
pub struct BundleLoader<'a> {
    registry: &'a ParamRegistry,
    next_slot: u16,
}

impl<'a> BundleLoader<'a> {
    pub fn new(registry: &'a ParamRegistry) -> Self {
        Self {
            registry,
            next_slot: 0,
        }
    }

    /// Size of the jitter table every mob needs for what was loaded so far.
    pub fn slot_count(&self) -> usize {
        self.next_slot as usize
    }

    pub fn registry(&self) -> &ParamRegistry {
        self.registry
    }

    fn take_slot(&mut self) -> AtomSlot {
        let slot = AtomSlot(self.next_slot);
        self.next_slot = self
            .next_slot
            .checked_add(1)
            .expect("more bundle atoms than jitter slots");
        slot
    }

    /// `{prefix}.value` and `{prefix}.mobJitterScale`.
    pub fn atom(&mut self, prefix: &str) -> Result<BundleAtom, ConfigError> {
        let value = self.registry.f32_or(&format!("{prefix}.value"), 0.0)?;
        let scale = self
            .registry
            .f32_or(&format!("{prefix}.mobJitterScale"), 0.0)?;
        Ok(BundleAtom::new(value, scale, self.take_slot()))
    }

    pub fn value(&mut self, prefix: &str) -> Result<BundleValue, ConfigError> {
        let type_key = format!("{prefix}.valueType");
        let atom = self.atom(&format!("{prefix}.value"))?;
        match self.registry.get_str(&type_key).unwrap_or("") {
            "" | "constant" | "none" => Ok(BundleValue::constant(atom)),
            "periodic" => {
                let periodic = Periodic {
                    period: self.atom(&format!("{prefix}.period"))?,
                    amplitude: self.atom(&format!("{prefix}.amplitude"))?,
                    tick_shift: self.atom(&format!("{prefix}.tickShift"))?,
                };
                Ok(BundleValue::periodic(atom, periodic))
            }
            other => Err(ConfigError::UnknownValueType {
                key: type_key,
                value: other.to_string(),
            }),
        }
    }

    pub fn check(&self, key: &str) -> Result<BundleCheck, ConfigError> {
        match self.registry.get_str(key) {
            None => Ok(BundleCheck::Never),
            Some(raw) => BundleCheck::from_key(raw).ok_or_else(|| ConfigError::UnknownCheck {
                key: key.to_string(),
                value: raw.to_string(),
            }),
        }
    }

    pub fn force(&mut self, prefix: &str) -> Result<BundleForce, ConfigError> {
        Ok(BundleForce {
            weight: self.value(&format!("{prefix}.weight"))?,
            range: BundleRange {
                check: self.check(&format!("{prefix}.range.check"))?,
                radius: self.value(&format!("{prefix}.range.radius"))?,
            },
            crowd: BundleCrowd {
                check: self.check(&format!("{prefix}.crowd.check"))?,
                size: self.value(&format!("{prefix}.crowd.size"))?,
                radius: self.value(&format!("{prefix}.crowd.radius"))?,
            },
        })
    }

    pub fn locus(&mut self, prefix: &str) -> Result<LocusParams, ConfigError> {
        Ok(LocusParams {
            circular_period: self.value(&format!("{prefix}.circularPeriod"))?,
            circular_weight: self.value(&format!("{prefix}.circularWeight"))?,
            linear_x_period: self.value(&format!("{prefix}.linearXPeriod"))?,
            linear_y_period: self.value(&format!("{prefix}.linearYPeriod"))?,
            linear_weight: self.value(&format!("{prefix}.linearWeight"))?,
            random_period: self.value(&format!("{prefix}.randomPeriod"))?,
            random_weight: self.value(&format!("{prefix}.randomWeight"))?,
            use_scaled: self
                .registry
                .bool_or(&format!("{prefix}.useScaled"), false)?,
        })
    }
}
