use nalgebra::{DMatrix, DVector, Rotation3, Vector3};

use crate::analysis::domain::error::AnalysisError;
use crate::shared::geometry::{Point2D, Point3D};

const ANGLE_THRESHOLD_DEGREES: f64 = 10.0;
const MAX_ITERATIONS: usize = 100;
const LAMBDA_MAX: f64 = 1e12;

/// Pinhole camera parameters used by the pose solve.
#[derive(Clone, Copy, Debug)]
pub struct CameraIntrinsics {
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
}

impl CameraIntrinsics {
    /// Approximate intrinsics for an uncalibrated frame: focal length equal
    /// to the frame width, principal point at (height/2, width/2).
    pub fn for_frame(width: u32, height: u32) -> Self {
        let f = width as f64;
        Self {
            fx: f,
            fy: f,
            cx: height as f64 / 2.0,
            cy: width as f64 / 2.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeadDirection {
    Left,
    Right,
    Down,
    Up,
    Center,
}

impl HeadDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeadDirection::Left => "Left",
            HeadDirection::Right => "Right",
            HeadDirection::Down => "Down",
            HeadDirection::Up => "Up",
            HeadDirection::Center => "Center",
        }
    }
}

/// Recovered head orientation, in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeadPose {
    pub pitch: f64,
    pub yaw: f64,
    pub roll: f64,
}

impl HeadPose {
    /// Coarse direction label. Yaw is checked before pitch, so a head turned
    /// left and tilted down reads as Left.
    pub fn direction(&self) -> HeadDirection {
        if self.yaw < -ANGLE_THRESHOLD_DEGREES {
            HeadDirection::Left
        } else if self.yaw > ANGLE_THRESHOLD_DEGREES {
            HeadDirection::Right
        } else if self.pitch < -ANGLE_THRESHOLD_DEGREES {
            HeadDirection::Down
        } else if self.pitch > ANGLE_THRESHOLD_DEGREES {
            HeadDirection::Up
        } else {
            HeadDirection::Center
        }
    }
}

/// Solves the perspective-n-point problem for the given 2D/3D
/// correspondences and decomposes the recovered rotation into Euler angles.
///
/// Uses Levenberg-Marquardt over the six pose parameters (a scaled-axis
/// rotation vector and a translation) with a numeric Jacobian. Needs at
/// least six correspondences; fewer, mismatched lists, or a divergent solve
/// all yield `PoseSolve`.
pub fn solve_head_pose(
    image_points: &[Point2D],
    model_points: &[Point3D],
    camera: &CameraIntrinsics,
) -> Result<HeadPose, AnalysisError> {
    if image_points.len() != model_points.len() {
        return Err(AnalysisError::PoseSolve(format!(
            "correspondence count mismatch: {} image points, {} model points",
            image_points.len(),
            model_points.len()
        )));
    }
    if image_points.len() < 6 {
        return Err(AnalysisError::PoseSolve(format!(
            "need at least 6 correspondences, got {}",
            image_points.len()
        )));
    }

    let mut params = initial_guess(image_points, model_points, camera);
    let mut residual = residuals(&params, image_points, model_points, camera)
        .ok_or_else(|| AnalysisError::PoseSolve("degenerate initial projection".to_string()))?;
    let mut cost = residual.norm_squared();
    let mut lambda = 1e-3;

    for _ in 0..MAX_ITERATIONS {
        let jacobian = numeric_jacobian(&params, image_points, model_points, camera)
            .ok_or_else(|| AnalysisError::PoseSolve("degenerate projection".to_string()))?;
        let jtj = jacobian.transpose() * &jacobian;
        let jtr = jacobian.transpose() * &residual;

        let mut damped = jtj.clone();
        for i in 0..6 {
            damped[(i, i)] += lambda * (1.0 + jtj[(i, i)]);
        }

        let step = match damped.lu().solve(&jtr) {
            Some(s) if s.iter().all(|v| v.is_finite()) => s,
            _ => {
                lambda *= 10.0;
                if lambda > LAMBDA_MAX {
                    return Err(AnalysisError::PoseSolve(
                        "normal equations are singular".to_string(),
                    ));
                }
                continue;
            }
        };

        let candidate = &params - &step;
        let accepted = residuals(&candidate, image_points, model_points, camera)
            .map(|r| (r.norm_squared(), r))
            .filter(|(c, _)| c.is_finite() && *c < cost);

        match accepted {
            Some((new_cost, new_residual)) => {
                let improvement = cost - new_cost;
                params = candidate;
                residual = new_residual;
                cost = new_cost;
                lambda = (lambda / 10.0).max(1e-12);
                if step.norm() < 1e-10 || improvement < 1e-12 {
                    break;
                }
            }
            None => {
                lambda *= 10.0;
                if lambda > LAMBDA_MAX {
                    return Err(AnalysisError::PoseSolve(
                        "failed to converge".to_string(),
                    ));
                }
            }
        }
    }

    let rotation = Rotation3::from_scaled_axis(Vector3::new(params[0], params[1], params[2]));
    Ok(euler_angles(&rotation))
}

/// Starts the rotation at identity and places the face on the optical axis
/// at roughly one focal length, shifted to line up the centroids.
fn initial_guess(
    image_points: &[Point2D],
    model_points: &[Point3D],
    camera: &CameraIntrinsics,
) -> DVector<f64> {
    let n = image_points.len() as f64;
    let mean_u = image_points.iter().map(|p| p.x).sum::<f64>() / n;
    let mean_v = image_points.iter().map(|p| p.y).sum::<f64>() / n;
    let mean_x = model_points.iter().map(|p| p.x).sum::<f64>() / n;
    let mean_y = model_points.iter().map(|p| p.y).sum::<f64>() / n;
    let mean_z = model_points.iter().map(|p| p.z).sum::<f64>() / n;

    let z0 = camera.fx;
    let tx = (mean_u - camera.cx) * z0 / camera.fx - mean_x;
    let ty = (mean_v - camera.cy) * z0 / camera.fy - mean_y;
    let tz = z0 - mean_z;
    DVector::from_vec(vec![0.0, 0.0, 0.0, tx, ty, tz])
}

/// Reprojection residuals `[u - u_obs, v - v_obs]` per correspondence.
/// `None` when a point lands on or behind the camera plane.
fn residuals(
    params: &DVector<f64>,
    image_points: &[Point2D],
    model_points: &[Point3D],
    camera: &CameraIntrinsics,
) -> Option<DVector<f64>> {
    let rotation = Rotation3::from_scaled_axis(Vector3::new(params[0], params[1], params[2]));
    let translation = Vector3::new(params[3], params[4], params[5]);

    let mut out = DVector::zeros(image_points.len() * 2);
    for (i, (observed, model)) in image_points.iter().zip(model_points).enumerate() {
        let in_camera = rotation * Vector3::new(model.x, model.y, model.z) + translation;
        if in_camera.z.abs() < 1e-9 {
            return None;
        }
        let u = camera.fx * in_camera.x / in_camera.z + camera.cx;
        let v = camera.fy * in_camera.y / in_camera.z + camera.cy;
        if !u.is_finite() || !v.is_finite() {
            return None;
        }
        out[2 * i] = u - observed.x;
        out[2 * i + 1] = v - observed.y;
    }
    Some(out)
}

fn numeric_jacobian(
    params: &DVector<f64>,
    image_points: &[Point2D],
    model_points: &[Point3D],
    camera: &CameraIntrinsics,
) -> Option<DMatrix<f64>> {
    let rows = image_points.len() * 2;
    let mut jacobian = DMatrix::zeros(rows, 6);
    for col in 0..6 {
        let step = 1e-6 * params[col].abs().max(1.0);
        let mut forward = params.clone();
        forward[col] += step;
        let mut backward = params.clone();
        backward[col] -= step;
        let f = residuals(&forward, image_points, model_points, camera)?;
        let b = residuals(&backward, image_points, model_points, camera)?;
        for row in 0..rows {
            jacobian[(row, col)] = (f[row] - b[row]) / (2.0 * step);
        }
    }
    Some(jacobian)
}

/// Decomposes R = Rx(pitch) * Ry(yaw) * Rz(roll).
fn euler_angles(rotation: &Rotation3<f64>) -> HeadPose {
    let m = rotation.matrix();
    let yaw = m[(0, 2)].clamp(-1.0, 1.0).asin();
    let pitch = (-m[(1, 2)]).atan2(m[(2, 2)]);
    let roll = (-m[(0, 1)]).atan2(m[(0, 0)]);
    HeadPose {
        pitch: pitch.to_degrees(),
        yaw: yaw.to_degrees(),
        roll: roll.to_degrees(),
    }
}
