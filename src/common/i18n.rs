// src/common/i18n.rs

use std::collections::HashMap;
use std::sync::Arc;

pub const DEFAULT_LOCALE: &str = "es";

type Catalog = HashMap<&'static str, &'static str>;

// Catálogo de mensagens por idioma. Clonar é barato (Arc).
#[derive(Clone)]
pub struct I18nStore {
    catalogs: Arc<HashMap<&'static str, Catalog>>,
}

impl I18nStore {
    pub fn new() -> Self {
        let mut catalogs = HashMap::new();
        catalogs.insert("es", HashMap::from(ES));
        catalogs.insert("en", HashMap::from(EN));
        Self {
            catalogs: Arc::new(catalogs),
        }
    }

    pub fn lookup(&self, locale: &str, key: &str) -> Option<&'static str> {
        self.catalogs.get(locale).and_then(|c| c.get(key)).copied()
    }

    /// Busca a mensagem no idioma pedido (ou no padrão) e substitui `{param}`.
    /// Chave desconhecida devolve a própria chave.
    pub fn translate(&self, locale: &str, key: &str, args: &[(&str, String)]) -> String {
        let template = self
            .lookup(locale, key)
            .or_else(|| self.lookup(DEFAULT_LOCALE, key))
            .unwrap_or(key);

        args.iter().fold(template.to_string(), |msg, (name, value)| {
            msg.replace(&format!("{{{name}}}"), value)
        })
    }
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new()
    }
}

const ES: [(&str, &str); 34] = [
    ("validation.failed", "Uno o más campos son inválidos."),
    ("validation.required", "El campo es obligatorio."),
    ("validation.email", "El e-mail no es válido."),
    ("validation.length", "El campo debe tener al menos {min} caracteres."),
    ("validation.range", "El valor debe ser al menos {min}."),
    ("validation.not_negative", "El valor no puede ser negativo."),
    ("validation.positive", "El valor debe ser mayor que cero."),
    ("validation.date_format", "La fecha debe tener el formato YYYY-MM-DD."),
    ("invoice.empty_items", "La factura debe tener al menos un ítem."),
    ("invoice.invalid_quantity", "Cantidad inválida para el producto {product_id}."),
    ("invoice.insufficient_stock", "Stock insuficiente para el producto {product_id}: disponible {available}, solicitado {requested}."),
    ("invoice.not_found", "Factura {id} no encontrada."),
    ("purchase.invalid_product_ref", "Referencia de producto inválida en la línea {line}."),
    ("purchase.new_product_name", "El nombre del producto es obligatorio para productos nuevos (línea {line})."),
    ("purchase.duplicate_number", "El número de factura {number} ya existe."),
    ("purchase.not_found", "Compra {id} no encontrada."),
    ("purchase.cancelled", "La compra {id} está cancelada."),
    ("payment.exceeds_balance", "El pago supera el saldo pendiente de la compra {purchase_id}."),
    ("product.not_found", "Producto {id} no encontrado."),
    ("product.forbidden", "Acceso denegado al producto {id}."),
    ("product.in_use", "El producto {id} está referenciado por facturas."),
    ("supplier.not_found", "Proveedor {id} no encontrado."),
    ("supplier.forbidden", "Acceso denegado al proveedor {id}."),
    ("supplier.tax_id_exists", "Ya existe un proveedor con el CUIT {tax_id}."),
    ("user.not_found", "Usuario no encontrado."),
    ("user.email_exists", "El e-mail ya está en uso."),
    ("user.invalid_role", "Rol inválido: {role}."),
    ("auth.invalid_credentials", "Credenciales inválidas."),
    ("auth.invalid_token", "Token de autenticación inválido o ausente."),
    ("auth.admin_required", "Se requiere rol de administrador."),
    ("tenant.invalid_header", "Cabecera X-Tenant-ID inválida."),
    ("tenant.mismatch", "La cabecera X-Tenant-ID no coincide con el token."),
    ("stock.missing_file", "Falta el archivo CSV (campo 'file')."),
    ("internal.unexpected", "Ocurrió un error inesperado."),
];

const EN: [(&str, &str); 34] = [
    ("validation.failed", "One or more fields are invalid."),
    ("validation.required", "This field is required."),
    ("validation.email", "The e-mail is not valid."),
    ("validation.length", "The field must have at least {min} characters."),
    ("validation.range", "The value must be at least {min}."),
    ("validation.not_negative", "The value cannot be negative."),
    ("validation.positive", "The value must be greater than zero."),
    ("validation.date_format", "The date must use the YYYY-MM-DD format."),
    ("invoice.empty_items", "The invoice needs at least one item."),
    ("invoice.invalid_quantity", "Invalid quantity for product {product_id}."),
    ("invoice.insufficient_stock", "Insufficient stock for product {product_id}: available {available}, requested {requested}."),
    ("invoice.not_found", "Invoice {id} not found."),
    ("purchase.invalid_product_ref", "Invalid product reference on line {line}."),
    ("purchase.new_product_name", "Product name is required for new products (line {line})."),
    ("purchase.duplicate_number", "Invoice number {number} already exists."),
    ("purchase.not_found", "Purchase {id} not found."),
    ("purchase.cancelled", "Purchase {id} is cancelled."),
    ("payment.exceeds_balance", "The payment exceeds the outstanding balance of purchase {purchase_id}."),
    ("product.not_found", "Product {id} not found."),
    ("product.forbidden", "Access denied to product {id}."),
    ("product.in_use", "Product {id} is referenced by invoices."),
    ("supplier.not_found", "Supplier {id} not found."),
    ("supplier.forbidden", "Access denied to supplier {id}."),
    ("supplier.tax_id_exists", "A supplier with tax id {tax_id} already exists."),
    ("user.not_found", "User not found."),
    ("user.email_exists", "This e-mail is already in use."),
    ("user.invalid_role", "Invalid role: {role}."),
    ("auth.invalid_credentials", "Invalid credentials."),
    ("auth.invalid_token", "Invalid or missing authentication token."),
    ("auth.admin_required", "Administrator role required."),
    ("tenant.invalid_header", "Invalid X-Tenant-ID header."),
    ("tenant.mismatch", "X-Tenant-ID header does not match the token."),
    ("stock.missing_file", "Missing CSV file (field 'file')."),
    ("internal.unexpected", "An unexpected error occurred."),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_catalogs_cover_the_same_keys() {
        let store = I18nStore::new();
        for (key, _) in ES {
            assert!(store.lookup("en", key).is_some(), "missing en key {key}");
        }
    }

    #[test]
    fn unknown_locale_falls_back_to_default() {
        let store = I18nStore::new();
        assert_eq!(
            store.translate("fr", "user.not_found", &[]),
            "Usuario no encontrado."
        );
    }

    #[test]
    fn params_are_interpolated() {
        let store = I18nStore::new();
        let msg = store.translate("en", "product.not_found", &[("id", "7".into())]);
        assert_eq!(msg, "Product 7 not found.");
    }

    #[test]
    fn unknown_key_is_returned_as_is() {
        assert_eq!(I18nStore::new().translate("en", "nope", &[]), "nope");
    }
}
