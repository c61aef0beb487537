/// raw bytes
#[derive(PartialEq, Eq, Clone, Debug, Hash)]
pub struct RedisString {
    pub bytes: Vec<u8>,
}

impl RedisString {
    pub fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl Default for RedisString {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RedisString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.bytes))
    }
}

impl From<String> for RedisString {
    fn from(str: String) -> Self {
        Self {
            bytes: str.as_bytes().to_vec(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RedisCmd {
    pub args: Vec<Vec<u8>>,
}

impl RedisCmd {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_str_args(args: &[&str]) -> Self {
        let mut me = Self::new();
        for arg in args.iter() {
            me.args.push(arg.as_bytes().to_vec());
        }
        me
    }

    pub fn add_arg(&mut self, arg: Vec<u8>) {
        self.args.push(arg);
    }

    pub fn add_str_arg(&mut self, arg: &str) {
        self.args.push(arg.as_bytes().to_vec());
    }

    pub fn add_redis_arg(&mut self, arg: &RedisString) {
        self.args.push(arg.as_bytes().to_vec());
    }

    pub fn get_str_arg(&self, idx: usize) -> String {
        if self.args.len() <= idx {
            String::new()
        } else {
            String::from_utf8_lossy(&self.args[idx]).to_string()
        }
    }

    pub fn get_malloc_size(&self) -> usize {
        let mut size = 0;
        for arg in &self.args {
            size += arg.len();
        }
        size
    }
}
