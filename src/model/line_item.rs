use crate::model::Amount;
use serde::{Deserialize, Serialize};

/// An ad-hoc flat-fee line item that does not depend on vehicle weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomServiceItem {
    pub name: String,
    pub price: Amount,
}

impl CustomServiceItem {
    pub fn new(name: impl Into<String>, price: impl Into<Amount>) -> Self {
        Self {
            name: name.into(),
            price: price.into(),
        }
    }
}

/// A flat fee for work done by a third party. Subcontractor charges are added to the invoice total
/// but are not part of the fuel surcharge base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubcontractorItem {
    pub name: String,
    #[serde(default)]
    pub work_performed: String,
    pub price: Amount,
}

impl SubcontractorItem {
    pub fn new(
        name: impl Into<String>,
        work_performed: impl Into<String>,
        price: impl Into<Amount>,
    ) -> Self {
        Self {
            name: name.into(),
            work_performed: work_performed.into(),
            price: price.into(),
        }
    }
}
