//! Chart payloads: a chart spec plus an optional primary dataset and any
//! number of named datasets.

use crate::element::table::Table;
use crate::element::NamedDataSet;
use crate::error::DataError;

/// A decoded dataset attached to a chart.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedDataSet {
    pub name: Option<String>,
    pub data: Table,
}

/// Decoded view of a chart element.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartView {
    pub spec: String,
    pub data: Option<Table>,
    pub datasets: Vec<DecodedDataSet>,
}

/// Where appended rows land on a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AppendTarget {
    Dataset(usize),
    Primary,
    ReplacePrimary,
}

impl ChartView {
    pub fn decode(
        spec: &str,
        data: Option<&[u8]>,
        datasets: &[NamedDataSet],
    ) -> Result<Self, DataError> {
        let data = data.map(Table::decode).transpose()?;
        let datasets = datasets
            .iter()
            .map(|ds| {
                Ok(DecodedDataSet {
                    name: ds.name.clone(),
                    data: Table::decode(&ds.data)?,
                })
            })
            .collect::<Result<Vec<_>, DataError>>()?;

        Ok(Self {
            spec: spec.to_string(),
            data,
            datasets,
        })
    }

    /// Append `rows` to this chart, returning the updated view.
    ///
    /// Resolution order:
    /// 1. named rows and exactly one dataset present: that dataset, whatever its name
    /// 2. named rows and a dataset with the same name: that dataset
    /// 3. a primary dataset exists: the primary dataset
    /// 4. otherwise the rows become the primary dataset
    pub fn add_rows(&self, name: Option<&str>, rows: &Table) -> Result<ChartView, DataError> {
        let mut updated = self.clone();
        match self.append_target(name) {
            AppendTarget::Dataset(position) => {
                let existing = &self.datasets[position].data;
                updated.datasets[position].data = existing.add_rows(rows)?;
            }
            AppendTarget::Primary => {
                if let Some(primary) = &self.data {
                    updated.data = Some(primary.add_rows(rows)?);
                }
            }
            AppendTarget::ReplacePrimary => {
                updated.data = Some(rows.clone());
            }
        }
        Ok(updated)
    }

    /// Where appended rows land. Named rows go to the only dataset when there
    /// is exactly one, whatever its name, and otherwise to the dataset with
    /// the same name.
    fn append_target(&self, name: Option<&str>) -> AppendTarget {
        if let Some(name) = name {
            if self.datasets.len() == 1 {
                return AppendTarget::Dataset(0);
            }
            if let Some(position) = self
                .datasets
                .iter()
                .position(|ds| ds.name.as_deref() == Some(name))
            {
                return AppendTarget::Dataset(position);
            }
        }

        if self.data.is_some() {
            AppendTarget::Primary
        } else {
            AppendTarget::ReplacePrimary
        }
    }
}
