pub mod tariff_data;
