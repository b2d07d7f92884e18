use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::core::{Incoterm, ProductId, TaxId, Transport};

/// Stock-level Intrastat configuration.
///
/// Company switches (`intrastat`, `intrastat_currency`) live on
/// [`Company`](crate::core::Company); this holds what is shared by every
/// company of the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntrastatConfig {
    /// Taxes that keep a move out of Intrastat (national-only operations).
    pub exempt_taxes: BTreeSet<TaxId>,
    /// Product used on invoice discount lines.
    pub discount_product: Option<ProductId>,
    /// Decimal places of the declared value.
    pub value_digits: u32,
    /// Decimal places of the additional (supplementary) unit quantity.
    pub additional_unit_digits: u32,
    /// Decimal places of price list unit prices.
    pub price_digits: u32,
    /// Transport mode used when neither the move nor its shipment has one.
    pub default_transport: Option<Transport>,
    /// Incoterm for consignment transfers between company warehouses.
    pub internal_incoterm: Option<Incoterm>,
}

impl Default for IntrastatConfig {
    fn default() -> Self {
        Self {
            exempt_taxes: BTreeSet::new(),
            discount_product: None,
            value_digits: 2,
            additional_unit_digits: 3,
            price_digits: 4,
            default_transport: Some(Transport::road()),
            internal_incoterm: Some(Incoterm::new("EXW", "2020")),
        }
    }
}

impl IntrastatConfig {
    pub fn is_exempt(&self, tax: TaxId) -> bool {
        self.exempt_taxes.contains(&tax)
    }
}

/// Builder for [`IntrastatConfig`].
///
/// ```
/// use intrastat::core::{ProductId, TaxId};
/// use intrastat::intrastat::IntrastatConfigBuilder;
///
/// let config = IntrastatConfigBuilder::new()
///     .exempt_tax(TaxId(21))
///     .discount_product(ProductId(7))
///     .build();
/// assert!(config.is_exempt(TaxId(21)));
/// ```
#[derive(Default)]
pub struct IntrastatConfigBuilder {
    config: IntrastatConfig,
}

impl IntrastatConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tax to the exempt set.
    pub fn exempt_tax(mut self, tax: TaxId) -> Self {
        self.config.exempt_taxes.insert(tax);
        self
    }

    /// Set the invoice discount product.
    pub fn discount_product(mut self, product: ProductId) -> Self {
        self.config.discount_product = Some(product);
        self
    }

    /// Set the decimal places of declared values.
    pub fn value_digits(mut self, digits: u32) -> Self {
        self.config.value_digits = digits;
        self
    }

    /// Set the decimal places of additional unit quantities.
    pub fn additional_unit_digits(mut self, digits: u32) -> Self {
        self.config.additional_unit_digits = digits;
        self
    }

    /// Set the decimal places of price list unit prices.
    pub fn price_digits(mut self, digits: u32) -> Self {
        self.config.price_digits = digits;
        self
    }

    /// Set the fallback transport mode, `None` to leave it unset.
    pub fn default_transport(mut self, transport: Option<Transport>) -> Self {
        self.config.default_transport = transport;
        self
    }

    /// Set the consignment incoterm, `None` to leave it unset.
    pub fn internal_incoterm(mut self, incoterm: Option<Incoterm>) -> Self {
        self.config.internal_incoterm = incoterm;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> IntrastatConfig {
        self.config
    }
}
