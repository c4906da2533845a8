use crate::circuit::Element;
use crate::cmplx;
use crate::dense::Mat;
use num_complex::Complex64;


/// Packs `[[ys, -ym], [-ym, ys]]` the way a circuit engine exports a
/// primitive admittance: row-major, real and imaginary parts interleaved.
pub fn pack(ys: &Mat<Complex64>, ym: &Mat<Complex64>) -> Vec<f64> {
    let h = ys.rows();
    let n = 2 * h;
    let mut packed = Vec::with_capacity(2 * n * n);
    for i in 0..n {
        for j in 0..n {
            let v = match (i < h, j < h) {
                (true, true) => ys.get(i, j),
                (false, false) => ys.get(i - h, j - h),
                (true, false) => -ym.get(i, j - h),
                (false, true) => -ym.get(i - h, j),
            };
            packed.push(v.re);
            packed.push(v.im);
        }
    }
    packed
}

/// Self (with shunt) and mutual blocks of an `h` phase line with equal
/// coupling between phases.
pub fn coupled(
    h: usize,
    y_self: Complex64,
    y_mutual: Complex64,
    y_shunt: Complex64,
) -> (Mat<Complex64>, Mat<Complex64>) {
    let mut ym = Mat::zeros(h, h);
    for i in 0..h {
        for j in 0..h {
            ym.set(i, j, if i == j { y_self } else { y_mutual });
        }
    }
    let ys = &ym + &Mat::with_diagonal(&vec![y_shunt; h]);
    (ys, ym)
}

pub fn element(name: &str, buses: &[&str], nodes: Vec<usize>) -> Element {
    Element {
        name: name.to_string(),
        buses: buses.iter().map(|b| b.to_string()).collect(),
        nodes,
        ..Default::default()
    }
}

pub fn line(name: &str, buses: &[&str], nodes: Vec<usize>) -> Element {
    let h = nodes.len() / 2;
    let (ys, ym) = coupled(h, cmplx!(4.0, -9.0), cmplx!(-1.0, 2.5), cmplx!(0.0, 0.002));
    Element {
        y_prim: pack(&ys, &ym),
        ..element(name, buses, nodes)
    }
}

/// Source, a three-phase line, a single-phase lateral with a capacitor,
/// a regulator feeding a switch, and a substation transformer.
pub fn feeder() -> Vec<Element> {
    vec![
        element("Vsource.source", &["sourcebus"], vec![1, 2, 3, 0, 0, 0]),
        line("Line.l1", &["sourcebus", "1"], vec![1, 2, 3, 1, 2, 3]),
        line("Line.l2", &["1.1", "2.1"], vec![1, 1]),
        element("Transformer.reg1", &["1", "1r"], vec![1, 2, 3, 1, 2, 3]),
        element("Line.sw1", &["1r", "3"], vec![1, 2, 3, 1, 2, 3]),
        element("Transformer.xfm1", &["3", "4"], vec![1, 2, 3, 1, 2, 3]),
        Element {
            kvar: Some(50.0),
            ..element("Capacitor.c2", &["2.1"], vec![1, 0])
        },
        element("Load.s2a", &["2.1"], vec![1, 0]),
    ]
}

pub fn assert_close(a: &Mat<Complex64>, b: &Mat<Complex64>, rtol: f64) {
    assert_eq!(a.shape(), b.shape());
    for (x, y) in a.values().iter().zip(b.values()) {
        assert!(
            (x - y).norm() <= rtol * x.norm().max(y.norm()).max(1.0),
            "{} != {}",
            x,
            y
        );
    }
}
