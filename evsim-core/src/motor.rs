//! Module containing motor models: the closed-form efficiency surface and the
//! topology-keyed electrical model.
//!
//! Electrical models are plain functions registered in [`ELECTRICAL_MODELS`] under
//! each topology code. A new topology is supported by registering another function.

use std::collections::HashMap;
use std::f64::consts::PI;

use lazy_static::lazy_static;

use crate::catalog::MotorSpec;
use crate::imports::*;
use crate::params::S_PER_MIN;

/// Smooth approximation of a motor efficiency map over (torque, speed).
///
/// $\eta = \eta_{max} - a (\eta_{max} - \eta_{min}) t_n^2 - b (\eta_{max} - \eta_{min}) n_n^{1.6}$
/// with $t_n = |T| / T_{ref}$ and $n_n = \max(0, N) / N_{ref}$, plus a copper-loss
/// penalty at very low speed and high torque. Output is clamped to
/// $[\eta_{min}, \eta_{max}]$.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EfficiencySurface {
    pub eta_max: f64,
    pub eta_min: f64,
    /// Reference torque used for normalization, $Nm$
    pub torque_ref_nm: f64,
    /// Reference speed used for normalization, $RPM$
    pub speed_ref_rpm: f64,
    /// Torque shape coefficient
    pub a: f64,
    /// Speed shape coefficient
    pub b: f64,
}

impl EfficiencySurface {
    const NORM_EPS: f64 = 1e-12;
    const SPEED_EXP: f64 = 1.6;
    const LOW_SPEED_FRAC: f64 = 0.05;
    const HIGH_TORQUE_FRAC: f64 = 0.5;
    const COPPER_PENALTY: f64 = 0.04;

    pub fn new(
        eta_max: f64,
        eta_min: f64,
        torque_ref_nm: f64,
        speed_ref_rpm: f64,
        a: f64,
        b: f64,
    ) -> Self {
        Self {
            eta_max,
            eta_min,
            torque_ref_nm,
            speed_ref_rpm,
            a,
            b,
        }
    }

    /// Efficiency at a single (torque, speed) operating point
    pub fn eval(&self, torque_nm: f64, speed_rpm: f64) -> f64 {
        let tn = torque_nm.abs() / (self.torque_ref_nm + Self::NORM_EPS);
        let nn = speed_rpm.max(0.0) / (self.speed_ref_rpm + Self::NORM_EPS);
        let span = self.eta_max - self.eta_min;

        let mut eta = self.eta_max
            - self.a * span * tn.powi(2)
            - self.b * span * nn.powf(Self::SPEED_EXP);
        if nn < Self::LOW_SPEED_FRAC && tn > Self::HIGH_TORQUE_FRAC {
            eta -= Self::COPPER_PENALTY * (tn - Self::HIGH_TORQUE_FRAC);
        }

        if eta.is_nan() {
            self.eta_min
        } else {
            eta.clamp(self.eta_min, self.eta_max)
        }
    }

    /// Elementwise efficiency over paired torque and speed sequences
    pub fn eval_array(
        &self,
        torque_nm: &Array1<f64>,
        speed_rpm: &Array1<f64>,
    ) -> anyhow::Result<Array1<f64>> {
        ensure!(
            torque_nm.len() == speed_rpm.len(),
            "{}\ntorque and speed lengths differ: {} vs {}",
            format_dbg!(),
            torque_nm.len(),
            speed_rpm.len()
        );
        Ok(torque_nm
            .iter()
            .zip(speed_rpm.iter())
            .map(|(&t, &n)| self.eval(t, n))
            .collect())
    }
}

/// Motor efficiency for `spec`, preferring its efficiency surface and falling back
/// to the scalar rating when none is registered
pub fn motor_efficiency(
    spec: &MotorSpec,
    torque_nm: &Array1<f64>,
    speed_rpm: &Array1<f64>,
) -> anyhow::Result<Array1<f64>> {
    match &spec.efficiency_surface {
        Some(surface) => surface.eval_array(torque_nm, speed_rpm),
        None => Ok(Array1::from_elem(torque_nm.len(), spec.efficiency)),
    }
}

/// Fixed equivalent-circuit constants of a motor topology
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MotorElectricalParameters {
    /// Phase resistance, $\Omega$
    pub phase_resistance_ohm: f64,
    /// Direct-axis inductance, $H$
    pub ld_h: Option<f64>,
    /// Quadrature-axis inductance, $H$
    pub lq_h: Option<f64>,
    /// Permanent magnet flux linkage, $Wb$
    pub flux_linkage_wb: Option<f64>,
    /// Unaligned (minimum) phase inductance, $H$
    pub l_min_h: Option<f64>,
    /// Aligned (maximum) phase inductance, $H$
    pub l_max_h: Option<f64>,
    pub pole_pairs: u32,
}

impl MotorElectricalParameters {
    pub fn synchronous(
        phase_resistance_ohm: f64,
        ld_h: f64,
        lq_h: f64,
        flux_linkage_wb: f64,
        pole_pairs: u32,
    ) -> Self {
        Self {
            phase_resistance_ohm,
            ld_h: Some(ld_h),
            lq_h: Some(lq_h),
            flux_linkage_wb: Some(flux_linkage_wb),
            l_min_h: None,
            l_max_h: None,
            pole_pairs,
        }
    }

    pub fn reluctance(phase_resistance_ohm: f64, l_min_h: f64, l_max_h: f64, pole_pairs: u32) -> Self {
        Self {
            phase_resistance_ohm,
            ld_h: None,
            lq_h: None,
            flux_linkage_wb: None,
            l_min_h: Some(l_min_h),
            l_max_h: Some(l_max_h),
            pole_pairs,
        }
    }
}

/// Phase and DC-bus quantities produced by an electrical model
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ElectricalOutputs {
    pub phase_current_a: Array1<f64>,
    pub phase_voltage_v: Array1<f64>,
    pub dc_current_a: Array1<f64>,
}

impl ElectricalOutputs {
    fn with_capacity(n: usize) -> Self {
        Self {
            phase_current_a: Array1::zeros(n),
            phase_voltage_v: Array1::zeros(n),
            dc_current_a: Array1::zeros(n),
        }
    }
}

/// Signature shared by every registered electrical model
pub type ElectricalModel = fn(
    torque_nm: &Array1<f64>,
    speed_rpm: &Array1<f64>,
    bus_voltage_v: f64,
    params: &MotorElectricalParameters,
) -> anyhow::Result<ElectricalOutputs>;

lazy_static! {
    /// Electrical model for each motor topology code
    pub static ref ELECTRICAL_MODELS: HashMap<&'static str, ElectricalModel> = {
        let mut models: HashMap<&'static str, ElectricalModel> = HashMap::new();
        for code in ["PMSM", "IPM", "IM", "BLDC", "AFPM"] {
            models.insert(code, synchronous_electrical);
        }
        models.insert("SRM", reluctance_electrical);
        models
    };
}

fn mech_to_elec_rad_per_s(speed_rpm: f64, pole_pairs: u32) -> f64 {
    pole_pairs as f64 * 2.0 * PI * speed_rpm / S_PER_MIN
}

fn required(param: Option<f64>, name: &str) -> anyhow::Result<f64> {
    match param {
        Some(x) => Ok(x),
        None => bail_config!("electrical parameter `{name}` is required by this motor topology"),
    }
}

/// Zero-d-axis-current control of a synchronous magnet machine
pub fn synchronous_electrical(
    torque_nm: &Array1<f64>,
    speed_rpm: &Array1<f64>,
    bus_voltage_v: f64,
    params: &MotorElectricalParameters,
) -> anyhow::Result<ElectricalOutputs> {
    let rs = params.phase_resistance_ohm;
    let ld = required(params.ld_h, "ld_h")?;
    let lq = required(params.lq_h, "lq_h")?;
    let lambda = required(params.flux_linkage_wb, "flux_linkage_wb")?;
    let p = params.pole_pairs as f64;
    ensure!(p * lambda != 0.0, "{}", format_dbg!(p * lambda));

    let mut out = ElectricalOutputs::with_capacity(torque_nm.len());
    for (i, (&torque, &rpm)) in torque_nm.iter().zip(speed_rpm.iter()).enumerate() {
        let omega_e = mech_to_elec_rad_per_s(rpm, params.pole_pairs);
        let iq = (2.0 / 3.0) * torque / (p * lambda);
        let id = 0.0_f64;
        let vd = rs * id - omega_e * lq * iq;
        let vq = rs * iq + omega_e * ld * id + omega_e * lambda;
        let v_ph = vd.hypot(vq);
        let i_ph = id.hypot(iq);
        out.phase_current_a[i] = i_ph;
        out.phase_voltage_v[i] = v_ph;
        out.dc_current_a[i] = v_ph * i_ph / bus_voltage_v;
    }
    Ok(out)
}

/// Switched reluctance machine from $T = \frac{1}{2} i^2 \frac{dL}{d\theta}$
pub fn reluctance_electrical(
    torque_nm: &Array1<f64>,
    speed_rpm: &Array1<f64>,
    bus_voltage_v: f64,
    params: &MotorElectricalParameters,
) -> anyhow::Result<ElectricalOutputs> {
    let rs = params.phase_resistance_ohm;
    let l_min = required(params.l_min_h, "l_min_h")?;
    let l_max = required(params.l_max_h, "l_max_h")?;
    let p = params.pole_pairs as f64;
    ensure!(p > 0.0, "{}", format_dbg!(p));

    // inductance slope per electrical radian
    let dl_dtheta = (l_max - l_min) / (PI / p);
    if dl_dtheta <= 0.0 {
        bail_config!("reluctance motor requires l_max_h > l_min_h, got {l_max} <= {l_min}");
    }
    let l_avg = 0.5 * (l_min + l_max);

    let mut out = ElectricalOutputs::with_capacity(torque_nm.len());
    for (i, (&torque, &rpm)) in torque_nm.iter().zip(speed_rpm.iter()).enumerate() {
        let omega_e = mech_to_elec_rad_per_s(rpm, params.pole_pairs);
        // current magnitude is independent of torque direction
        let i_ph = (2.0 * torque.abs() / dl_dtheta).sqrt();
        let v_ph = rs * i_ph + omega_e * l_avg * i_ph;
        out.phase_current_a[i] = i_ph;
        out.phase_voltage_v[i] = v_ph;
        out.dc_current_a[i] = v_ph * i_ph / bus_voltage_v;
    }
    Ok(out)
}

/// Runs the electrical model registered for `spec.code`
pub fn electrical_outputs(
    spec: &MotorSpec,
    torque_nm: &Array1<f64>,
    speed_rpm: &Array1<f64>,
    bus_voltage_v: f64,
) -> anyhow::Result<ElectricalOutputs> {
    let model = match ELECTRICAL_MODELS.get(spec.code.as_str()) {
        Some(model) => model,
        None => {
            let mut codes: Vec<_> = ELECTRICAL_MODELS.keys().collect();
            codes.sort();
            bail_config!(
                "no electrical model for motor topology {:?}, must be one of {codes:?}",
                spec.code
            )
        }
    };
    ensure!(
        torque_nm.len() == speed_rpm.len(),
        "{}\ntorque and speed lengths differ",
        format_dbg!()
    );
    if bus_voltage_v <= 0.0 {
        bail_config!("bus voltage must be positive, got {bus_voltage_v}");
    }
    model(torque_nm, speed_rpm, bus_voltage_v, &spec.electrical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CATALOG;

    fn pmsm_surface() -> EfficiencySurface {
        EfficiencySurface::new(0.94, 0.6, 160.0, 6000.0, 0.6, 0.55)
    }

    #[test]
    fn test_surface_peak_at_origin() {
        let s = pmsm_surface();
        assert_eq!(s.eval(0.0, 0.0), 0.94);
    }

    #[test]
    fn test_surface_hand_computed_point() {
        let s = pmsm_surface();
        // tn = 0.5, nn = 0.5
        let span = 0.94 - 0.6;
        let expected = 0.94 - 0.6 * span * 0.25 - 0.55 * span * 0.5_f64.powf(1.6);
        assert!(s.eval(80.0, 3000.0).approx_eq(&expected, 1e-9));
    }

    #[test]
    fn test_surface_copper_penalty() {
        let s = pmsm_surface();
        // tn = 0.75 at standstill gets the low-speed penalty
        let span = 0.94 - 0.6;
        let expected = 0.94 - 0.6 * span * 0.75_f64.powi(2) - 0.04 * 0.25;
        assert!(s.eval(120.0, 0.0).approx_eq(&expected, 1e-9));
    }

    #[test]
    fn test_surface_bounded_everywhere() {
        let s = pmsm_surface();
        for &t in &[-1e4, -300.0, -1.0, 0.0, 10.0, 160.0, 1e5] {
            for &n in &[-5000.0, -1.0, 0.0, 100.0, 6000.0, 2e4] {
                let eta = s.eval(t, n);
                assert!((s.eta_min..=s.eta_max).contains(&eta), "{t} {n} {eta}");
            }
        }
        assert_eq!(s.eval(f64::NAN, 0.0), s.eta_min);
    }

    #[test]
    fn test_surface_array_matches_scalar() {
        let s = pmsm_surface();
        let t = array![0.0, 50.0, -200.0];
        let n = array![0.0, 4000.0, 1000.0];
        let etas = s.eval_array(&t, &n).unwrap();
        for i in 0..3 {
            assert_eq!(etas[i], s.eval(t[i], n[i]));
        }
        assert!(s.eval_array(&t, &array![0.0]).is_err());
    }

    #[test]
    fn test_scalar_fallback() {
        let mut spec = CATALOG.motor("PMSM").unwrap().clone();
        spec.efficiency_surface = None;
        let etas = motor_efficiency(&spec, &array![10.0, 500.0], &array![100.0, 9000.0]).unwrap();
        assert_eq!(etas, array![0.92, 0.92]);
    }

    #[test]
    fn test_dispatch_covers_catalog() {
        for code in CATALOG.motors.keys() {
            assert!(ELECTRICAL_MODELS.contains_key(code));
        }
    }

    #[test]
    fn test_synchronous_hand_computed() {
        let spec = CATALOG.motor("PMSM").unwrap();
        let out = electrical_outputs(spec, &array![0.24], &array![0.0], 400.0).unwrap();
        // at standstill: iq = (2/3) * 0.24 / (4 * 0.06) = 2/3, vq = Rs * iq
        let iq = 2.0 / 3.0;
        assert!(out.phase_current_a[0].approx_eq(&iq, 1e-12));
        assert!(out.phase_voltage_v[0].approx_eq(&(0.05 * iq), 1e-12));
        assert!(out.dc_current_a[0].approx_eq(&(0.05 * iq * iq / 400.0), 1e-12));
    }

    #[test]
    fn test_synchronous_back_emf() {
        let spec = CATALOG.motor("IPM").unwrap();
        let rpm = 3000.0;
        let out = electrical_outputs(spec, &array![0.0], &array![rpm], 800.0).unwrap();
        let omega_e = 4.0 * 2.0 * PI * rpm / 60.0;
        assert_eq!(out.phase_current_a[0], 0.0);
        assert!(out.phase_voltage_v[0].approx_eq(&(omega_e * 0.06), 1e-12));
        assert_eq!(out.dc_current_a[0], 0.0);
    }

    #[test]
    fn test_reluctance_current_finite() {
        let spec = CATALOG.motor("SRM").unwrap();
        let torque = array![0.0, 50.0, -50.0, 250.0];
        let out = electrical_outputs(spec, &torque, &array![0.0, 1000.0, 1000.0, 3000.0], 400.0)
            .unwrap();
        assert!(out.phase_current_a.iter().all(|i| i.is_finite()));
        assert_eq!(out.phase_current_a[0], 0.0);
        assert_eq!(out.phase_current_a[1], out.phase_current_a[2]);
        let dl = (0.001 - 0.0001) / (PI / 4.0);
        assert!(out.phase_current_a[1].approx_eq(&(100.0 / dl).sqrt(), 1e-12));
    }

    #[test]
    fn test_reluctance_rejects_flat_inductance() {
        let mut spec = CATALOG.motor("SRM").unwrap().clone();
        spec.electrical.l_max_h = spec.electrical.l_min_h;
        let err = electrical_outputs(&spec, &array![1.0], &array![1.0], 400.0).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_unknown_topology() {
        let mut spec = CATALOG.motor("PMSM").unwrap().clone();
        spec.code = "DCM".into();
        assert!(electrical_outputs(&spec, &array![1.0], &array![1.0], 400.0).is_err());
    }
}
