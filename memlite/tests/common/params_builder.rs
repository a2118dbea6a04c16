pub struct MemliteServerParamsBuilder {
    max_records: Option<usize>,
    max_item_size: Option<String>,
    fast: bool,
}

impl MemliteServerParamsBuilder {
    pub fn new() -> MemliteServerParamsBuilder {
        MemliteServerParamsBuilder {
            max_records: None,
            max_item_size: None,
            fast: false,
        }
    }

    #[allow(dead_code)]
    pub fn with_max_records(&mut self, max_records: usize) -> &mut Self {
        self.max_records = Some(max_records);
        self
    }

    #[allow(dead_code)]
    pub fn with_max_item_size(&mut self, max_item_size: &str) -> &mut Self {
        self.max_item_size = Some(String::from(max_item_size));
        self
    }

    #[allow(dead_code)]
    pub fn with_fast_mode(&mut self) -> &mut Self {
        self.fast = true;
        self
    }

    pub fn build(&self) -> Vec<String> {
        let mut result: Vec<String> = vec![String::from("memlited")];
        if let Some(max_records) = self.max_records {
            result.push(String::from("--max-records"));
            result.push(max_records.to_string());
        }
        if let Some(max_item_size) = &self.max_item_size {
            result.push(String::from("--max-item-size"));
            result.push(max_item_size.clone());
        }
        if self.fast {
            result.push(String::from("--fast"));
        }
        result
    }
}
