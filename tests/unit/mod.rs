mod table_properties;
