/// Interquartile-range outlier rejection for the candidate time grid.
///
/// A monitor that is restarted, or a host whose clock is off, can leave a few samples far away from
/// everyone else's; those would otherwise stretch the time axis of every chart.
///
/// The quartiles are computed the quick way, by indexing the sorted values:
///
///   - if len/4 is integral, Q1 = avg(v[len/4], v[len/4 + 1]) and Q3 = avg(v[3len/4], v[3len/4 + 1])
///   - otherwise Q1 = v[floor(len/4) + 1] and Q3 = v[ceil(3len/4) + 1]
///
/// For small inputs these indices can run off the end of the array; they are clamped to the last
/// element.  Values in [Q1 - 1.5 IQR, Q3 + 1.5 IQR] are retained, in their input order and with
/// any duplicates.  Inputs with fewer than four values are returned unchanged.

const MIN_VALUES: usize = 4;
const IQR_FACTOR: f64 = 1.5;

pub fn filter_outliers(values: &[f64]) -> Vec<f64> {
    if values.len() < MIN_VALUES {
        return values.to_vec();
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len();
    let at = |i: usize| sorted[usize::min(i, n - 1)];
    let (q1, q3) = if n % 4 == 0 {
        let lo = n / 4;
        let hi = n * 3 / 4;
        ((at(lo) + at(lo + 1)) / 2.0, (at(hi) + at(hi + 1)) / 2.0)
    } else {
        // ceil(3n/4) in integers
        let hi = (n * 3 + 3) / 4;
        (at(n / 4 + 1), at(hi + 1))
    };

    let iqr = q3 - q1;
    let lower = q1 - iqr * IQR_FACTOR;
    let upper = q3 + iqr * IQR_FACTOR;
    values
        .iter()
        .copied()
        .filter(|&x| x >= lower && x <= upper)
        .collect()
}

#[test]
fn test_small_inputs_are_identity() {
    assert!(filter_outliers(&[]).is_empty());
    assert_eq!(filter_outliers(&[1000.0, 1.0, -50.0]), vec![1000.0, 1.0, -50.0]);
}

#[test]
fn test_rejects_low_outlier() {
    // n=8: Q1 = avg(v[2], v[3]) = 10, Q3 = avg(v[6], v[7]) = 10, so anything but 10 goes.
    let xs = [10.0, 10.0, -1000.0, 10.0, 10.0, 10.0, 10.0, 10.0];
    assert_eq!(filter_outliers(&xs), vec![10.0; 7]);
}

#[test]
fn test_keeps_order_and_duplicates() {
    // n=6: Q1 = v[2] = 3, Q3 = v[clamp(6)] = v[5] = 6, IQR = 3, bounds [-1.5, 10.5].
    let xs = [6.0, 1.0, 3.0, 3.0, 2.0, 5.0];
    assert_eq!(filter_outliers(&xs), xs.to_vec());
}

#[test]
fn test_clamped_quartile_index() {
    // n=5: ceil(15/4) + 1 = 5 is one past the end.  Must not panic.
    let xs = [1.0, 2.0, 3.0, 4.0, 5.0];
    assert_eq!(filter_outliers(&xs), xs.to_vec());
}

#[test]
fn test_idempotent() {
    let inputs: Vec<Vec<f64>> = vec![
        vec![10.0, 10.0, -1000.0, 10.0, 10.0, 10.0, 10.0, 10.0],
        vec![0.0, 60.0, 120.0, 180.0, 240.0, 300.0, 360.0, 100000.0, -100000.0],
        vec![5.0, 5.0, 5.0, 5.0],
        vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0],
    ];
    for xs in inputs {
        let once = filter_outliers(&xs);
        let twice = filter_outliers(&once);
        assert_eq!(once, twice);
    }
}
