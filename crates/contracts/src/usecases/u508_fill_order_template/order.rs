use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Соответствие "вариант названия -> стандартное название товара"
pub type NameMapping = HashMap<String, String>;

/// Блок заказа одного магазина после выделения названия магазина
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedOrder {
    #[serde(rename = "storeName")]
    pub store_name: String,

    /// Строки с товарами в порядке документа
    #[serde(rename = "productLines")]
    pub product_lines: Vec<String>,
}

/// Одна распознанная строка заказа
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(rename = "rawName")]
    pub raw_name: String,

    /// Всегда строго положительное
    pub quantity: u32,
}

/// Количество одного стандартного товара
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductQuantity {
    pub name: String,
    pub quantity: u32,
}

/// Заказ магазина в стандартных названиях, готовый к записи в шаблон
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardizedOrder {
    #[serde(rename = "storeName")]
    pub store_name: String,

    /// Товары в порядке первого появления в тексте, названия уникальны
    pub products: Vec<ProductQuantity>,
}

impl StandardizedOrder {
    pub fn new(store_name: impl Into<String>) -> Self {
        Self {
            store_name: store_name.into(),
            products: Vec::new(),
        }
    }

    /// Повтор названия заменяет количество на месте и возвращает прежнее
    pub fn set(&mut self, name: impl Into<String>, quantity: u32) -> Option<u32> {
        let name = name.into();
        match self.products.iter_mut().find(|p| p.name == name) {
            Some(existing) => Some(std::mem::replace(&mut existing.quantity, quantity)),
            None => {
                self.products.push(ProductQuantity { name, quantity });
                None
            }
        }
    }

    pub fn quantity(&self, name: &str) -> Option<u32> {
        self.products
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_keeps_first_position() {
        let mut order = StandardizedOrder::new("黄记");
        assert_eq!(order.set("鱼蛋", 1), None);
        assert_eq!(order.set("牛肉丸", 2), None);
        assert_eq!(order.set("鱼蛋", 7), Some(1));

        let names: Vec<&str> = order.products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["鱼蛋", "牛肉丸"]);
        assert_eq!(order.quantity("鱼蛋"), Some(7));
        assert_eq!(order.quantity("墨鱼丸"), None);
    }
}
