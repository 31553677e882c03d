use std::collections::BTreeSet;
use std::fmt;

/// Per-class scores. Divisions by zero score 0.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassScores {
    pub label: usize,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Precision / recall / F1 per class plus overall accuracy.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationReport {
    pub classes: Vec<ClassScores>,
    pub accuracy: f64,
    /// `confusion[i][j]`: rows with actual class `classes[i]` predicted as `classes[j]`.
    pub confusion: Vec<Vec<usize>>,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

impl ClassificationReport {
    /// Score `predicted` against `actual`. Classes are every label seen on
    /// either side, in ascending order.
    pub fn new(actual: &[usize], predicted: &[usize]) -> Self {
        let labels: Vec<usize> = actual
            .iter()
            .chain(predicted)
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let pos = |l: usize| labels.iter().position(|&x| x == l).unwrap_or(0);

        let mut confusion = vec![vec![0usize; labels.len()]; labels.len()];
        for (&a, &p) in actual.iter().zip(predicted) {
            confusion[pos(a)][pos(p)] += 1;
        }

        let classes = labels
            .iter()
            .enumerate()
            .map(|(i, &label)| {
                let tp = confusion[i][i];
                let support: usize = confusion[i].iter().sum();
                let predicted_as: usize = confusion.iter().map(|row| row[i]).sum();
                let precision = ratio(tp, predicted_as);
                let recall = ratio(tp, support);
                let f1 = if precision + recall == 0.0 {
                    0.0
                } else {
                    2.0 * precision * recall / (precision + recall)
                };
                ClassScores {
                    label,
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect();

        let total = actual.len().min(predicted.len());
        let correct = (0..labels.len()).map(|i| confusion[i][i]).sum();

        ClassificationReport {
            classes,
            accuracy: ratio(correct, total),
            confusion,
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>12} {:>10} {:>10} {:>10} {:>10}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        for c in &self.classes {
            writeln!(
                f,
                "{:>12} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                c.label, c.precision, c.recall, c.f1, c.support
            )?;
        }
        let support: usize = self.classes.iter().map(|c| c.support).sum();
        write!(
            f,
            "{:>12} {:>10} {:>10} {:>10.2} {:>10}",
            "accuracy", "", "", self.accuracy, support
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_scores() {
        let actual = [1, 1, 1, 0, 0, 0];
        let predicted = [1, 1, 0, 0, 0, 1];
        let report = ClassificationReport::new(&actual, &predicted);

        assert_eq!(report.confusion, vec![vec![2, 1], vec![1, 2]]);
        assert!((report.accuracy - 4.0 / 6.0).abs() < 1e-12);
        let ones = &report.classes[1];
        assert_eq!(ones.label, 1);
        assert_eq!(ones.support, 3);
        assert!((ones.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((ones.recall - 2.0 / 3.0).abs() < 1e-12);
        assert!((ones.f1 - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn never_predicted_class_scores_zero() {
        let report = ClassificationReport::new(&[0, 1, 1], &[0, 0, 0]);
        let ones = &report.classes[1];
        assert_eq!(ones.precision, 0.0);
        assert_eq!(ones.recall, 0.0);
        assert_eq!(ones.f1, 0.0);
        assert!(report.to_string().contains("accuracy"));
    }
}
